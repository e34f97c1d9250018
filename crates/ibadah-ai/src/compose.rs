//! Prompt composers for the bot's AI-sourced messages.
//!
//! Prompts are in Indonesian, mirroring the audience. Composers that feed
//! MarkdownV2 contexts escape their output; the dzikir/dhuha/jumat helpers
//! return raw text and leave escaping to the embedding site.

use rand::seq::SliceRandom;

use ibadah_db::DailyLog;
use ibadah_report::analyze_logs;
use ibadah_types::{ChatTurn, DzikirTime, escape_markdown_v2};

use crate::{ScriptureSource, TextCompleter};

/// Ask the model for a one-to-two-word motivation theme from a log summary.
async fn theme_for(ai: &dyn TextCompleter, log_summary: &str) -> Option<String> {
    let prompt = format!(
        "Berdasarkan ringkasan aktivitas ibadah pengguna berikut: \"{log_summary}\", \
         berikan satu kata kunci atau tema yang paling relevan untuk diberikan motivasi \
         dalam bahasa Indonesia. \
         Contoh: 'syukur', 'sabar', 'keutamaan sholat', 'sedekah', 'istiqomah'. \
         Jawab HANYA dengan 1-2 kata saja."
    );
    match ai.complete(&[ChatTurn::user(prompt)], 10).await {
        Ok(theme) => Some(theme),
        Err(e) => {
            tracing::warn!("theme completion failed: {e:#}");
            None
        }
    }
}

/// One-sentence motivation with a verse quote, ready to append to a
/// MarkdownV2 message (leading blank line and quote marker included).
pub async fn motivational_message(
    ai: &dyn TextCompleter,
    scripture: &dyn ScriptureSource,
    logs: &[DailyLog],
) -> String {
    let log_summary = analyze_logs(logs);

    let mut prompt = format!(
        "Anda adalah seorang motivator Islami yang memberikan nasihat singkat dan berbobot.\n\
         Ringkasan Ibadah Pengguna: {log_summary}\n"
    );
    if let Some(theme) = theme_for(ai, &log_summary).await {
        if let Some(verse) = scripture.quran(&theme).await {
            prompt.push_str(&format!(
                "Dalil Pendukung:\n{} {}\n",
                verse.text, verse.reference
            ));
        }
    }
    prompt.push_str(
        "Instruksi Final:\n\
         1. Berikan SATU kalimat motivasi singkat yang relevan dengan ringkasan ibadah.\n\
         2. Setelah itu, KUTIP POTONGAN PALING RELEVAN dari terjemahan ayat di 'Dalil Pendukung'.\n\
         3. JANGAN ADA SAPAAN.\n\
         4. Format WAJIB: [Kalimat Motivasi Anda].\n\n\
         📜 _\"[Potongan kutipan ayat di sini]\"_ [Referensi Ayat].",
    );

    match ai.complete(&[ChatTurn::user(prompt)], 100).await {
        Ok(text) => format!("\n\n> {}", escape_markdown_v2(&text)),
        Err(e) => {
            tracing::warn!("motivational message failed: {e:#}");
            format!(
                "\n\n> {}",
                escape_markdown_v2("Gagal mendapatkan motivasi personal saat ini.")
            )
        }
    }
}

/// Short dzikir encouragement for the given slot. Raw text.
pub async fn dzikir_motivation(ai: &dyn TextCompleter, when: DzikirTime) -> String {
    let prompt = format!(
        "Tuliskan SATU kalimat singkat dalam bahasa Indonesia yang mengajak untuk \
         berdzikir di waktu {} beserta keutamaannya. Tanpa sapaan.",
        when.label()
    );
    match ai.complete(&[ChatTurn::user(prompt)], 60).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("dzikir motivation failed: {e:#}");
            "Luangkan waktu sejenak untuk mengingat Allah.".to_string()
        }
    }
}

/// Short dhuha encouragement. Raw text.
pub async fn dhuha_motivation(ai: &dyn TextCompleter) -> String {
    let prompt = "Tuliskan SATU kalimat singkat dalam bahasa Indonesia tentang \
                  keutamaan sholat Dhuha. Tanpa sapaan.";
    match ai.complete(&[ChatTurn::user(prompt)], 60).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("dhuha motivation failed: {e:#}");
            "Dua rakaat Dhuha membuka pintu rezeki dan rasa syukur.".to_string()
        }
    }
}

/// Short Friday encouragement. Raw text.
pub async fn jumat_motivation(ai: &dyn TextCompleter) -> String {
    let prompt = "Tuliskan SATU kalimat singkat dalam bahasa Indonesia tentang \
                  keutamaan hari Jumat, shalawat, dan Surah Al-Kahfi. Tanpa sapaan.";
    match ai.complete(&[ChatTurn::user(prompt)], 60).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("jumat motivation failed: {e:#}");
            "Perbanyak shalawat dan bacalah Surah Al-Kahfi di hari Jumat.".to_string()
        }
    }
}

/// Answer one discussion turn as a dalil-grounded Islamic consultant.
///
/// `history` holds the prior turns; the current question is embedded in a
/// fresh master prompt together with retrieved references and the user's
/// devotion summary. Returned raw (callers attempt Markdown, then plain).
pub async fn discussion_response(
    ai: &dyn TextCompleter,
    scripture: &dyn ScriptureSource,
    question: &str,
    history: &[ChatTurn],
    devotion_summary: &str,
) -> String {
    let quran_ref = scripture.quran(question).await;
    let keywords: Vec<&str> = question.split_whitespace().collect();
    let hadith_ref = if keywords.len() > 1 {
        let keyword = keywords
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(question);
        scripture.hadith(keyword).await
    } else {
        None
    };

    let mut prompt = format!(
        "Anda adalah seorang Konsultan Islami AI yang bijaksana, empatik, dan berpegang \
         teguh pada dalil. Anda memberikan jawaban yang personal dan relevan berdasarkan \
         history percakapan dan ringkasan rutinitas ibadah pengguna.\n\n\
         KONTEKS PENGGUNA:\n\
         1. Pertanyaan Pengguna Saat Ini: \"{question}\"\n\
         2. Ringkasan Rutinitas Ibadah Pengguna: {devotion_summary}\n\
         3. Sapa pengguna dengan hormat di awal jawaban Anda dengan singkat, misalnya \
         \"Saudaraku yang dirahmati Allah,\". Apabila dia memberikan pujian, balas dengan \
         ucapan terima kasih. Apabila dia mengeluh, berikan empati. Apabila dia bertanya, \
         jawab dengan jelas dan ringkas.\n\
         REFERENSI DALIL YANG DITEMUKAN:\n"
    );
    if let Some(verse) = &quran_ref {
        prompt.push_str(&format!(
            "\n- Al-Qur'an: {} | {} {}\n",
            verse.arabic, verse.text, verse.reference
        ));
    }
    if let Some(hadith) = &hadith_ref {
        prompt.push_str(&format!("\n- Hadis: {} {}\n", hadith.text, hadith.reference));
    }
    prompt.push_str(
        "\nINSTRUKSI FINAL WAJIB DIPATUHI:\n\
         1. Apabila ada pertanyaan dari pengguna jawab HANYA BERDASARKAN referensi dalil \
         yang diberikan. JANGAN berhalusinasi atau menggunakan pengetahuan eksternal.\n\
         2. Kaitkan jawaban Anda dengan 'Ringkasan Rutinitas Ibadah Pengguna'. Jika \
         pengguna bertanya tentang amalan yang ia sering lewatkan, berikan jawaban yang \
         lebih menyemangati.\n\
         3. Struktur Jawaban: jawaban to the point yang memparafrasekan dalil, teks Arab \
         jika tersedia, kutipan terjemahan dalil paling relevan, dan sumbernya.\n\
         4. Jika referensi tidak cukup, WAJIB jawab: \"Mohon maaf, saya tidak menemukan \
         dalil yang relevan untuk menjawab pertanyaan Anda secara spesifik. Sebaiknya \
         Anda bertanya kepada ustadz atau ahli fiqih terpercaya.\"\n\
         5. Akhiri jawaban dengan disclaimer: \"_Jawaban ini adalah hasil parafrase dari \
         AI berdasarkan dalil yang ditemukan dan perlu divalidasi oleh ahli. \
         Wallahu a'lam._\"",
    );

    let mut turns = history.to_vec();
    turns.push(ChatTurn::user(prompt));

    match ai.complete(&turns, 600).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("discussion completion failed: {e:#}");
            escape_markdown_v2("Maaf, terjadi kesalahan saat menyusun jawaban.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use ibadah_types::{HadithRef, VerseRef};

    /// Completer that records prompts and replies with a fixed string.
    struct FakeCompleter {
        reply: Option<String>,
        prompts: Mutex<Vec<Vec<ChatTurn>>>,
    }

    impl FakeCompleter {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextCompleter for FakeCompleter {
        async fn complete(&self, turns: &[ChatTurn], _max_tokens: u32) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(turns.to_vec());
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => anyhow::bail!("completion unavailable"),
            }
        }
    }

    struct FakeScripture {
        verse: Option<VerseRef>,
        hadith: Option<HadithRef>,
    }

    #[async_trait]
    impl ScriptureSource for FakeScripture {
        async fn quran(&self, _keyword: &str) -> Option<VerseRef> {
            self.verse.clone()
        }
        async fn hadith(&self, _keyword: &str) -> Option<HadithRef> {
            self.hadith.clone()
        }
    }

    fn verse() -> VerseRef {
        VerseRef {
            text: "Mohonlah pertolongan dengan sabar dan sholat.".into(),
            arabic: "وَاسْتَعِينُوا بِالصَّبْرِ وَالصَّلَاةِ".into(),
            reference: "QS. Al-Baqarah: 45".into(),
        }
    }

    #[tokio::test]
    async fn test_motivational_message_escaped_quote() {
        let ai = FakeCompleter::replying("Istiqomah itu berat, tapi indah. (QS. 2:45)");
        let scripture = FakeScripture {
            verse: Some(verse()),
            hadith: None,
        };
        let msg = motivational_message(&ai, &scripture, &[]).await;
        assert!(msg.starts_with("\n\n> "));
        // Literal parens and dot must come back escaped.
        assert!(msg.contains(r"\(QS\. 2:45\)"));
    }

    #[tokio::test]
    async fn test_motivational_message_fallback() {
        let ai = FakeCompleter::failing();
        let scripture = FakeScripture {
            verse: None,
            hadith: None,
        };
        let msg = motivational_message(&ai, &scripture, &[]).await;
        assert!(msg.contains("Gagal mendapatkan motivasi"));
    }

    #[tokio::test]
    async fn test_discussion_prompt_includes_references_and_history() {
        let ai = FakeCompleter::replying("Saudaraku, sabar itu...");
        let scripture = FakeScripture {
            verse: Some(verse()),
            hadith: Some(HadithRef {
                text: "Amal tergantung niat".into(),
                reference: "HR. Bukhari No. 1".into(),
            }),
        };
        let history = vec![ChatTurn::user("salam"), ChatTurn::assistant("wa'alaikumsalam")];
        let answer =
            discussion_response(&ai, &scripture, "Bagaimana cara sabar?", &history, "ringkasan").await;
        assert_eq!(answer, "Saudaraku, sabar itu...");

        let prompts = ai.prompts.lock().unwrap();
        let turns = &prompts[0];
        // History first, master prompt last.
        assert_eq!(turns.len(), 3);
        let master = &turns[2].content;
        assert!(master.contains("QS. Al-Baqarah: 45"));
        assert!(master.contains("HR. Bukhari No. 1"));
        assert!(master.contains("ringkasan"));
    }

    #[tokio::test]
    async fn test_single_word_question_skips_hadith() {
        let ai = FakeCompleter::replying("jawaban");
        let scripture = FakeScripture {
            verse: None,
            hadith: Some(HadithRef {
                text: "tidak boleh muncul".into(),
                reference: "HR. Muslim No. 2".into(),
            }),
        };
        discussion_response(&ai, &scripture, "sabar", &[], "ringkasan").await;
        let prompts = ai.prompts.lock().unwrap();
        assert!(!prompts[0][0].content.contains("tidak boleh muncul"));
    }

    #[tokio::test]
    async fn test_dzikir_fallback_on_failure() {
        let ai = FakeCompleter::failing();
        let msg = dzikir_motivation(&ai, DzikirTime::Pagi).await;
        assert!(msg.contains("mengingat Allah"));
    }
}
