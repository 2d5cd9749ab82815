pub const INTENT_SYSTEM_PROMPT: &str =
    "You classify chat messages for a personal finance assistant. Output MUST be a single valid JSON object.";

pub fn build_intent_prompt(message: &str) -> String {
    format!(
        r#"Kamu adalah AI classifier untuk FiNot, aplikasi keuangan pribadi.

Klasifikasikan pesan user ke salah satu intent berikut:

1. transaction: mencatat transaksi. Contoh: "beli makan 25rb", "gajian 5jt", "transfer 100rb"
2. help: minta bantuan. Contoh: "cara pakai", "bantuan", "/help", "/start"
3. history: melihat riwayat transaksi. Contoh: "lihat transaksi hari ini", "rekap minggu ini"
4. export: mengunduh data. Contoh: "export excel", "download laporan"
5. small_talk: obrolan ringan. Contoh: "hai", "terima kasih", "mantap"
6. insight: insight harian. Contoh: "insight hari ini", "gimana keuanganku"
7. prediction: prediksi umur saldo. Contoh: "prediksi saldo", "saldo tahan berapa hari"
8. saving_rec: rekomendasi tabungan. Contoh: "harus nabung berapa", "saran tabungan"
9. health_score: skor kesehatan keuangan. Contoh: "health score", "sehat gak keuanganku"
10. simulation: simulasi hemat. Contoh: "kalau hemat 10rb", "bagaimana kalau kurangi jajan"
11. analysis: analisis mingguan/bulanan. Contoh: "analisis minggu ini", "laporan bulanan"
12. upgrade: ingin upgrade paket. Contoh: "upgrade", "beli pro", "harga langganan"
13. status: cek status langganan. Contoh: "status saya", "sisa kredit"
14. unknown: intent tidak jelas

PERIOD (untuk history/export/analysis):
- "hari ini", "today" → "today"
- "minggu ini", "mingguan" → "week"
- "bulan ini", "bulanan" → "month"
- "tahun ini", "tahunan" → "year"

DIRECTION:
- "pemasukan", "income" → "income"
- "pengeluaran", "expense" → "expense"

Output JSON:
{{
  "intent": "<intent>",
  "confidence": <0.0-1.0>,
  "period": "today|week|month|year" atau null,
  "direction": "income|expense" atau null,
  "reasoning": "<penjelasan singkat>"
}}

PENTING:
- Jika ada nominal uang, kemungkinan besar transaction
- Prioritas: transaction > fitur analisis > perintah navigasi

User message: "{message}""#
    )
}
