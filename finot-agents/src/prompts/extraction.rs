use shared_types::Category;

fn category_list() -> String {
    Category::ALL
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_text_prompt(message: &str) -> String {
    format!(
        r#"Kamu adalah AI parser untuk transaksi keuangan pribadi.

## Format Output

Selalu keluarkan SATU objek JSON dengan array "transactions":
{{
  "transactions": [
    {{
      "intent": "Pemasukan|Pengeluaran",
      "amount": <integer>,
      "currency": "IDR",
      "date": "<ISO8601, today, yesterday, atau null>",
      "category": "<string>",
      "note": "<string>",
      "confidence": <0.0-1.0>
    }}
  ]
}}

- Satu pesan bisa berisi BEBERAPA transaksi: pisahkan menjadi beberapa elemen array
- Jika hanya ada 1 transaksi, tetap gunakan array berisi 1 elemen
- Kata pemisah yang umum: "dan", "kemarin", "tadi", "juga", koma, titik koma

## Intent

- "Pemasukan": uang masuk (gaji, bonus, transfer masuk, dapat uang)
- "Pengeluaran": uang keluar (bayar, beli, transfer keluar, hilang)

## Category

Pilih kategori yang paling dekat dengan kata-kata user. Kategori baku: {categories}.
Jika tidak ada yang cocok, gunakan kata dari user apa adanya (misal "nongkrong", "bensin").

## Amount

- Slang Indonesia: "25rb" → 25000, "5jt" → 5000000, "150k" → 150000
- "ribu" → 000, "juta" → 000000
- Jika tidak ada nominal, set amount = 0

## Confidence

- 0.9-1.0: sangat jelas
- 0.7-0.9: jelas
- 0.5-0.7: cukup jelas
- 0.3-0.5: tidak jelas

## Contoh

Input: "Makan siang warteg 25rb"
Output: {{"transactions": [{{"intent": "Pengeluaran", "amount": 25000, "currency": "IDR", "date": null, "category": "makan", "note": "Makan siang di warteg", "confidence": 0.95}}]}}

Input: "hari ini beli makan 50rb, kemarin beli rokok 20rb, gajian 500rb"
Output: {{"transactions": [
  {{"intent": "Pengeluaran", "amount": 50000, "currency": "IDR", "date": "today", "category": "makan", "note": "Beli makan hari ini", "confidence": 0.90}},
  {{"intent": "Pengeluaran", "amount": 20000, "currency": "IDR", "date": "yesterday", "category": "lainnya", "note": "Beli rokok kemarin", "confidence": 0.88}},
  {{"intent": "Pemasukan", "amount": 500000, "currency": "IDR", "date": null, "category": "gaji", "note": "Gajian", "confidence": 0.92}}
]}}

Input: "{message}"
Output:"#,
        categories = category_list(),
        message = message,
    )
}

pub fn build_receipt_prompt(ocr_text: &str) -> String {
    format!(
        r#"Kamu adalah AI parser untuk struk pembayaran.

Input berikut adalah hasil OCR dari foto struk dan bisa TIDAK SEMPURNA:
- karakter tertukar (0↔O, 1↔I, 5↔S, 8↔B)
- kata terpotong atau typo
- angka tidak lengkap
- urutan baris acak

## Tugas

1. Temukan TOTAL yang dibayar (cari TOTAL, GRAND TOTAL, JUMLAH, AMOUNT, BAYAR)
2. Temukan nama merchant/toko (biasanya di bagian atas)
3. Temukan tanggal transaksi
4. Tentukan kategori dari jenis toko

## Format Output (SATU transaksi)

{{
  "transactions": [
    {{
      "intent": "Pengeluaran",
      "amount": <integer>,
      "currency": "IDR",
      "date": "<YYYY-MM-DD atau null>",
      "category": "<string>",
      "note": "<nama merchant + detail>",
      "confidence": <0.0-1.0>
    }}
  ]
}}

## Category

- Indomaret / Alfamart / minimarket → "belanja"
- Warteg / restoran / cafe → "makan"
- Starbucks / kedai kopi / minuman → "minuman"
- Apotek / farmasi → "kesehatan"
- PLN / listrik / Telkom / pulsa → "tagihan"
- Bioskop / XXI / cinema → "hiburan"
- Gojek / Grab / taksi → "transportasi"
- Selain itu → "lainnya"

## Amount

- Ambil angka pada baris TOTAL; jika ragu ambil angka TERBESAR
- Perbaiki salah baca OCR: O→0, I/l→1, S→5, B→8
- Titik dan koma adalah pemisah ribuan ("25.000" → 25000)

Input (hasil OCR):
"""
{ocr_text}
"""

Output:"#,
        ocr_text = ocr_text,
    )
}

pub fn build_audio_prompt(transcription: &str) -> String {
    format!(
        r#"Kamu adalah AI parser untuk transaksi keuangan dari pesan suara.

Input adalah transkripsi otomatis dari suara user. Bisa ada:
- kata tidak jelas atau typo dari speech-to-text
- angka yang diucapkan sebagai kata
- bahasa informal / slang Indonesia

## Format Output

{{
  "transactions": [
    {{
      "intent": "Pemasukan|Pengeluaran",
      "amount": <integer>,
      "currency": "IDR",
      "date": "<ISO8601, today, yesterday, atau null>",
      "category": "<string>",
      "note": "<string>",
      "confidence": <0.0-1.0>
    }}
  ]
}}

## Angka dalam kata

- "seribu" → 1000
- "dua ribu" → 2000
- "sepuluh ribu" → 10000
- "dua puluh lima ribu" → 25000
- "seratus ribu" → 100000
- "lima ratus ribu" → 500000
- "sejuta" / "satu juta" → 1000000
- Slang juga berlaku: "25rb" → 25000, "5jt" → 5000000

## Category

Pilih salah satu: {categories}

Input (transkripsi suara):
"{transcription}"

Output:"#,
        categories = category_list(),
        transcription = transcription,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prompt_embeds_message_and_examples() {
        let prompt = build_text_prompt("beli makan 25rb");
        assert!(prompt.contains("Input: \"beli makan 25rb\""));
        assert!(prompt.contains("\"transactions\""));
        assert!(prompt.contains("gajian 500rb"));
        assert!(prompt.ends_with("Output:"));
    }

    #[test]
    fn test_receipt_prompt_is_single_transaction() {
        let prompt = build_receipt_prompt("INDOMARET\nTOTAL 25.000");
        assert!(prompt.contains("SATU transaksi"));
        assert!(prompt.contains("INDOMARET\nTOTAL 25.000"));
    }

    #[test]
    fn test_audio_prompt_lists_every_category() {
        let prompt = build_audio_prompt("beli bensin dua puluh ribu");
        for category in Category::ALL {
            assert!(prompt.contains(category.as_str()));
        }
        assert!(prompt.contains("\"beli bensin dua puluh ribu\""));
    }
}
