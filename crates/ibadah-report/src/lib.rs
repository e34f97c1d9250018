//! ibadah-report: devotion-log analysis and report composition.
//!
//! Pure text over `DailyLog` rows; the AI motivation that trails a report
//! is appended by the caller.

use std::collections::HashMap;

use ibadah_db::DailyLog;
use ibadah_types::{
    CHECKLIST_ITEMS, LAINNYA_ITEMS, SUNNAH_ITEMS, WAJIB_ITEMS, escape_markdown_v2,
};

/// Reporting window selectable from the bot menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Harian,
    Mingguan,
    Bulanan,
}

impl ReportPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Harian => "Harian",
            ReportPeriod::Mingguan => "Mingguan",
            ReportPeriod::Bulanan => "Bulanan",
        }
    }

    /// Days covered, counting today.
    pub fn window_days(&self) -> i64 {
        match self {
            ReportPeriod::Harian => 1,
            ReportPeriod::Mingguan => 7,
            ReportPeriod::Bulanan => 30,
        }
    }

    /// Parse the lowercase key used in callback data (`laporan_<key>`).
    pub fn from_key(key: &str) -> Option<ReportPeriod> {
        match key {
            "harian" => Some(ReportPeriod::Harian),
            "mingguan" => Some(ReportPeriod::Mingguan),
            "bulanan" => Some(ReportPeriod::Bulanan),
            _ => None,
        }
    }
}

/// Per-item completion counts over a set of logs.
fn item_counts(logs: &[DailyLog]) -> HashMap<&'static str, usize> {
    let mut counts: HashMap<&'static str, usize> =
        CHECKLIST_ITEMS.iter().map(|i| (*i, 0)).collect();
    for log in logs {
        for item in CHECKLIST_ITEMS {
            if log.is_done(item) {
                *counts.entry(item).or_default() += 1;
            }
        }
    }
    counts
}

/// One-paragraph plain-text summary of a user's habits, fed into AI
/// prompts.
pub fn analyze_logs(logs: &[DailyLog]) -> String {
    if logs.is_empty() {
        return "Pengguna ini belum memiliki catatan ibadah.".to_string();
    }

    let counts = item_counts(logs);
    let total_wajib: usize = WAJIB_ITEMS.iter().map(|i| counts[i]).sum();

    let best = WAJIB_ITEMS
        .iter()
        .chain(&SUNNAH_ITEMS)
        .chain(&LAINNYA_ITEMS)
        .find(|i| counts[**i] > 0);
    let missed = WAJIB_ITEMS.iter().find(|i| counts[**i] == 0);

    let mut summary = format!("Pengguna menyelesaikan {total_wajib} dari 5 sholat wajib. ");
    if let Some(item) = best {
        summary.push_str(&format!("Dia sudah berhasil mengerjakan amalan '{item}'. "));
    }
    if let Some(item) = missed {
        summary.push_str(&format!("Namun, dia terlewat dalam amalan '{item}'."));
    }
    summary
}

/// Compose the MarkdownV2 report body for a period.
pub fn generate_report(logs: &[DailyLog], period: ReportPeriod) -> String {
    let safe_period = escape_markdown_v2(period.label());
    if logs.is_empty() {
        return format!("Belum ada data ibadah untuk *{safe_period}*\\.");
    }

    let total_days = logs.len();
    let counts = item_counts(logs);

    let mut report = format!(
        "📊 *Laporan Ibadah \\- Periode {safe_period}*\n_{}_\n\n",
        escape_markdown_v2(&format!("{total_days} hari terakhir"))
    );

    let total_wajib: usize = WAJIB_ITEMS.iter().map(|i| counts[i]).sum();
    let expected_wajib = total_days * WAJIB_ITEMS.len();
    let pct = if expected_wajib > 0 {
        total_wajib as f64 / expected_wajib as f64 * 100.0
    } else {
        0.0
    };
    report.push_str(&format!(
        "*🕌 Ibadah Wajib*\nKomitmen: *{pct:.0}%* `({total_wajib}/{expected_wajib})`\n\n"
    ));

    report.push_str("*✨ Ibadah Sunnah*\n");
    for item in SUNNAH_ITEMS {
        report.push_str(&format!(
            "\\- {}: *{} kali*\n",
            escape_markdown_v2(item),
            counts[item]
        ));
    }
    report.push('\n');

    let fasts: Vec<_> = CHECKLIST_ITEMS
        .iter()
        .filter(|i| i.starts_with("Puasa") && counts[**i] > 0)
        .collect();
    if !fasts.is_empty() {
        report.push_str("*🌙 Puasa Sunnah*\n");
        for item in fasts {
            report.push_str(&format!(
                "\\- {}: *{} kali*\n",
                escape_markdown_v2(item),
                counts[*item]
            ));
        }
        report.push('\n');
    }

    report.push_str("*💖 Ibadah Lainnya*\n");
    for item in LAINNYA_ITEMS {
        report.push_str(&format!(
            "\\- {}: *{} kali*\n",
            escape_markdown_v2(item),
            counts[item]
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn log_with(date: &str, done: &[&str]) -> DailyLog {
        let mut items = HashMap::new();
        for item in CHECKLIST_ITEMS {
            let status = if done.contains(&item) { "Sudah" } else { "Belum" };
            items.insert(item.to_string(), status.to_string());
        }
        DailyLog {
            user_id: 1,
            date: date.into(),
            items,
        }
    }

    #[test]
    fn test_analyze_empty() {
        assert_eq!(
            analyze_logs(&[]),
            "Pengguna ini belum memiliki catatan ibadah."
        );
    }

    #[test]
    fn test_analyze_counts_wajib_and_names_missed() {
        let logs = vec![
            log_with("2024-07-01", &["Subuh", "Dzuhur", "Tilawah"]),
            log_with("2024-07-02", &["Subuh"]),
        ];
        let summary = analyze_logs(&logs);
        assert!(summary.contains("menyelesaikan 3 dari 5 sholat wajib"));
        assert!(summary.contains("'Subuh'"));
        // Ashar was never done; it is the first missed wajib.
        assert!(summary.contains("terlewat dalam amalan 'Ashar'"));
    }

    #[test]
    fn test_report_empty() {
        let report = generate_report(&[], ReportPeriod::Mingguan);
        assert_eq!(report, "Belum ada data ibadah untuk *Mingguan*\\.");
    }

    #[test]
    fn test_report_commitment_percentage() {
        // 5 of 10 expected wajib prayers over two days.
        let logs = vec![
            log_with("2024-07-01", &["Subuh", "Dzuhur", "Ashar"]),
            log_with("2024-07-02", &["Maghrib", "Isya"]),
        ];
        let report = generate_report(&logs, ReportPeriod::Harian);
        assert!(report.contains("*50%* `(5/10)`"));
        assert!(report.contains("2 hari terakhir"));
    }

    #[test]
    fn test_report_fasts_only_when_present() {
        let without = generate_report(&[log_with("2024-07-01", &["Subuh"])], ReportPeriod::Harian);
        assert!(!without.contains("Puasa Sunnah"));

        let with = generate_report(
            &[log_with("2024-07-01", &["Puasa Senin"])],
            ReportPeriod::Harian,
        );
        assert!(with.contains("Puasa Sunnah"));
        assert!(with.contains("Puasa Senin"));
    }

    #[test]
    fn test_period_keys() {
        assert_eq!(ReportPeriod::from_key("harian"), Some(ReportPeriod::Harian));
        assert_eq!(ReportPeriod::from_key("bulanan"), Some(ReportPeriod::Bulanan));
        assert_eq!(ReportPeriod::from_key("tahunan"), None);
        assert_eq!(ReportPeriod::Mingguan.window_days(), 7);
    }
}
