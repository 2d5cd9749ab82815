use shared_types::{StoredTransaction, TransactionIntent};

pub const NO_TRANSACTIONS: &str = "Tidak ada transaksi dalam periode ini.";

/// Formats whole rupiah with dot thousands separators, e.g. `Rp1.250.000`.
pub fn format_idr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-Rp{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}

/// Renders stored transactions as the totals + detail block the analysis
/// prompts embed.
pub fn transaction_summary(transactions: &[StoredTransaction]) -> String {
    if transactions.is_empty() {
        return NO_TRANSACTIONS.to_string();
    }

    let mut total_income = 0i64;
    let mut total_expense = 0i64;
    let mut lines = Vec::with_capacity(transactions.len());

    for tx in transactions {
        let label = match tx.intent {
            TransactionIntent::Income => {
                total_income = total_income.saturating_add(tx.amount);
                "Pemasukan"
            }
            TransactionIntent::Expense => {
                total_expense = total_expense.saturating_add(tx.amount);
                "Pengeluaran"
            }
        };
        lines.push(format!(
            "- {}: {} {} [{}] {}",
            tx.tx_date.format("%Y-%m-%d"),
            label,
            format_idr(tx.amount),
            tx.category,
            tx.note
        ));
    }

    format!(
        "Total transaksi: {}\nTotal pemasukan: {}\nTotal pengeluaran: {}\nNet: {}\n\nDetail transaksi:\n{}",
        transactions.len(),
        format_idr(total_income),
        format_idr(total_expense),
        format_idr(total_income.saturating_sub(total_expense)),
        lines.join("\n")
    )
}

pub fn build_daily_insight_prompt(summary: &str) -> String {
    format!(
        r#"Kamu adalah FiNot, asisten keuangan pribadi yang bicara santai seperti teman dekat.

Analisis transaksi hari ini dan berikan insight yang terasa personal, bukan template.

Data transaksi hari ini:
{summary}

ATURAN:
1. Bandingkan pengeluaran hari ini dengan rata-rata harian dari data
2. Proyeksikan pengeluaran bulanan jika pola ini berlanjut
3. Berikan 1 saran praktis yang spesifik
4. Bahasa Indonesia santai tapi cerdas

Format output JSON:
{{
  "insight": "<2-3 kalimat: bandingkan dengan rata-rata, beri proyeksi>",
  "tip": "<1 kalimat saran berdasarkan data nyata>",
  "emoji_mood": "<1 emoji kondisi keuangan hari ini>"
}}

Contoh insight yang BAGUS:
"Hari ini kamu menghabiskan Rp75.000, sekitar 56% di atas rata-rata harianmu. Kalau pola ini berlanjut, pengeluaran bulan ini bisa melewati Rp810.000."

Contoh yang JELEK:
"Transaksi hari ini sudah tercatat. Tetap semangat!" (terlalu generik)"#
    )
}

pub fn build_balance_prediction_prompt(summary: &str, current_balance: i64) -> String {
    format!(
        r#"Kamu adalah FiNot, analis keuangan yang bicara personal seperti teman dekat yang cerdas.

Prediksi berapa hari saldo user akan bertahan, dan SELALU sertakan skenario "bagaimana jika" pengeluaran dikurangi sedikit.

Data transaksi (30 hari terakhir):
{summary}

Saldo saat ini: {balance}

ATURAN:
1. Hitung rata-rata pengeluaran harian dari data nyata
2. Hari bertahan = saldo / rata-rata pengeluaran harian
3. WAJIB ada skenario, misal: "Jika kamu mengurangi Rp10.000 per hari, umur saldo bertambah sekitar X hari."
4. Bahasa Indonesia santai dan personal

Format output JSON:
{{
  "daily_avg_expense": <rata-rata pengeluaran harian>,
  "daily_avg_income": <rata-rata pemasukan harian>,
  "predicted_days": <estimasi hari saldo bertahan>,
  "prediction_confidence": <0.0-1.0>,
  "explanation": "<2-3 kalimat termasuk skenario bagaimana-jika>"
}}"#,
        balance = format_idr(current_balance),
    )
}

pub fn build_saving_recommendation_prompt(summary: &str) -> String {
    format!(
        r#"Kamu adalah FiNot, penasihat keuangan yang bicara personal dan terasa dekat.

Berikan rekomendasi tabungan berdasarkan pola keuangan user. Harus PERSONAL, bukan template.

Data transaksi (30 hari terakhir):
{summary}

ATURAN:
1. Hitung pendapatan bersih (pemasukan - pengeluaran) dari data
2. Rekomendasi harus realistis, jangan terlalu ambisius
3. Strategi spesifik ke pola user
4. Tips harus bisa langsung dilakukan

Format output JSON:
{{
  "net_income": <pendapatan bersih bulanan>,
  "total_expense": <total pengeluaran>,
  "recommended_saving": <nominal tabungan yang disarankan>,
  "saving_percentage": <persentase dari pemasukan>,
  "strategy": "<2-3 kalimat, personal berdasarkan data>",
  "specific_tips": ["<tip 1>", "<tip 2>", "<tip 3>"]
}}"#
    )
}

pub fn build_financial_health_prompt(summary: &str) -> String {
    format!(
        r#"Kamu adalah FiNot, penilai kesehatan keuangan. Jangan cuma memberi angka, berikan INTERPRETASI yang bermakna.

Hitung skor kesehatan keuangan user (0-100).

Data transaksi (30 hari terakhir):
{summary}

Kriteria skor:
1. Saving Ratio (0-35 poin): persentase pemasukan yang ditabung
   - >30%: 35, 20-30%: 28, 10-20%: 20, 5-10%: 12, <5%: 5
2. Stabilitas Pengeluaran (0-30 poin): konsistensi pengeluaran harian
   - CV < 0.3: 30, CV 0.3-0.5: 22, CV 0.5-0.8: 15, CV > 0.8: 8
3. Arus Kas (0-35 poin): rasio pemasukan terhadap pengeluaran
   - > 1.5x: 35, 1.2-1.5x: 28, 1.0-1.2x: 20, < 1.0x: 10

ATURAN:
1. Summary WAJIB berisi interpretasi skor (misal "Cukup Stabil", "Perlu Perbaikan")
2. Summary WAJIB menyebut kekuatan DAN area perbaikan
3. Rekomendasi spesifik ke data user

Format output JSON:
{{
  "total_score": <0-100>,
  "grade": "<A/B/C/D/F>",
  "saving_ratio_score": <0-35>,
  "stability_score": <0-30>,
  "cashflow_score": <0-35>,
  "saving_ratio": <persentase>,
  "summary": "<interpretasi, kekuatan, area perbaikan>",
  "recommendations": ["<saran 1>", "<saran 2>"]
}}"#
    )
}

/// Simulates the effect of a free-text saving scenario ("kurangi nongkrong 3x/minggu").
pub fn build_saving_simulation_prompt(
    scenario: &str,
    current_balance: i64,
    daily_avg_expense: i64,
    summary: &str,
) -> String {
    format!(
        r#"Kamu adalah FiNot, simulator keuangan. Simulasikan dampak skenario hemat user dengan cara yang bikin semangat.

User bertanya: "{scenario}"

Data:
- Saldo saat ini: {balance}
- Rata-rata pengeluaran harian: {daily_avg}
- Riwayat transaksi terkini:
{summary}

ATURAN:
1. Pahami skenario user (misal "kurangi nongkrong 3x/minggu", "hemat 10rb per hari")
2. Estimasikan nominal penghematan berdasarkan data transaksi
3. Hitung dampak bulanan dan tahunan
4. Hitung tambahan umur saldo
5. Bahasa santai dan personal

Format output JSON:
{{
  "scenario": "<apa yang disimulasikan>",
  "estimated_saving_per_occurrence": <nominal per kejadian>,
  "monthly_saving": <total hemat per bulan>,
  "yearly_saving": <total hemat per tahun>,
  "extra_balance_days": <tambahan hari saldo bertahan>,
  "message": "<2-3 kalimat, personal dan memotivasi>"
}}"#,
        balance = format_idr(current_balance),
        daily_avg = format_idr(daily_avg_expense),
    )
}

/// Fixed daily-cut variant of [`build_saving_simulation_prompt`].
pub fn build_fixed_cut_simulation_prompt(
    daily_cut: i64,
    current_balance: i64,
    daily_avg_expense: i64,
    summary: &str,
) -> String {
    let scenario = format!("hemat {} per hari", format_idr(daily_cut));
    build_saving_simulation_prompt(&scenario, current_balance, daily_avg_expense, summary)
}

pub fn build_weekly_analysis_prompt(summary: &str) -> String {
    format!(
        r#"Kamu adalah FiNot, analis keuangan. Analisis harus spesifik dan bisa ditindaklanjuti.

Lakukan analisis mendalam untuk transaksi minggu ini.

Data transaksi (7 hari terakhir):
{summary}

ATURAN:
1. Bandingkan kategori pengeluaran: mana yang naik atau turun
2. Identifikasi pola harian (hari apa paling boros)
3. Insight spesifik, bukan generik
4. Action items berupa langkah konkret

Format output JSON:
{{
  "total_income": <total pemasukan>,
  "total_expense": <total pengeluaran>,
  "net": <selisih>,
  "top_categories": [
    {{"category": "<nama>", "amount": <jumlah>, "percentage": <persen>, "trend": "<naik/turun/stabil>"}}
  ],
  "daily_pattern": "<hari apa pengeluaran tinggi>",
  "comparison": "<perbandingan dengan minggu sebelumnya jika bisa diestimasi>",
  "insight": "<2-3 kalimat, spesifik>",
  "action_items": ["<langkah 1>", "<langkah 2>"]
}}"#
    )
}

pub fn build_monthly_analysis_prompt(summary: &str) -> String {
    format!(
        r#"Kamu adalah FiNot, analis keuangan senior. Analisis bulanan harus strategis dan mendalam.

Lakukan analisis komprehensif untuk transaksi bulan ini.

Data transaksi (30 hari terakhir):
{summary}

ATURAN:
1. Hitung saving rate (persentase pemasukan yang ditabung)
2. Identifikasi lonjakan pengeluaran tidak rutin
3. Proyeksikan potensi tabungan 12 bulan ke depan
4. Berikan prioritas aksi yang strategis
5. Deep insight 3-4 kalimat

Format output JSON:
{{
  "total_income": <total pemasukan>,
  "total_expense": <total pengeluaran>,
  "net_income": <pendapatan bersih>,
  "saving_rate": <persentase tabungan>,
  "top_expense_categories": [
    {{"category": "<nama>", "amount": <jumlah>, "percentage": <persen>}}
  ],
  "spending_trend": "<naik/turun/stabil>",
  "income_stability": "<analisis stabilitas pemasukan>",
  "habit_analysis": "<analisis kebiasaan keuangan>",
  "forecast_next_month": {{
    "predicted_expense": <prediksi pengeluaran>,
    "predicted_income": <prediksi pemasukan>,
    "predicted_saving": <prediksi tabungan>
  }},
  "deep_insight": "<3-4 kalimat, strategis>",
  "priority_actions": ["<aksi 1>", "<aksi 2>", "<aksi 3>"]
}}"#
    )
}
