//! ibadah-types: shared domain types for the ibadah bot.
//!
//! Prayer names and their fixed order, the daily checklist catalogue,
//! notification kinds, user status, MarkdownV2 escaping, and the Hijri
//! calendar rules behind seasonal sunnah fasts.

pub mod hijri;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

// ──────────────────── Checklist catalogue ────────────────────

/// The five obligatory daily prayers, in order.
pub const WAJIB_ITEMS: [&str; 5] = ["Subuh", "Dzuhur", "Ashar", "Maghrib", "Isya"];

/// Recommended (sunnah) prayers tracked daily.
pub const SUNNAH_ITEMS: [&str; 3] = ["Tahajud", "Dhuha", "Rawatib"];

/// Other daily devotional acts.
pub const LAINNYA_ITEMS: [&str; 3] = ["Tilawah", "Dzikir", "Sedekah"];

/// Seasonal sunnah fasts. These share the daily-log schema but only show up
/// in the checklist on the days the Hijri calendar says they apply.
pub const FAST_ITEMS: [&str; 5] = [
    "Puasa Senin",
    "Puasa Kamis",
    "Puasa Ayyamul Bidh",
    "Puasa Arafah",
    "Puasa Tasu'a/Asyura",
];

/// All 16 checklist items, one column each in the daily log table.
pub const CHECKLIST_ITEMS: [&str; 16] = [
    "Subuh",
    "Dzuhur",
    "Ashar",
    "Maghrib",
    "Isya",
    "Tahajud",
    "Dhuha",
    "Rawatib",
    "Tilawah",
    "Dzikir",
    "Sedekah",
    "Puasa Senin",
    "Puasa Kamis",
    "Puasa Ayyamul Bidh",
    "Puasa Arafah",
    "Puasa Tasu'a/Asyura",
];

/// Status value for a completed checklist item.
pub const STATUS_DONE: &str = "Sudah";
/// Status value for a pending checklist item.
pub const STATUS_PENDING: &str = "Belum";

/// Returns true if `item` is one of the 16 tracked checklist items.
pub fn is_checklist_item(item: &str) -> bool {
    CHECKLIST_ITEMS.contains(&item)
}

// ──────────────────── Prayers ────────────────────

/// One of the five obligatory prayers, ordered Subuh < Dzuhur < Ashar <
/// Maghrib < Isya.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prayer {
    Subuh,
    Dzuhur,
    Ashar,
    Maghrib,
    Isya,
}

impl Prayer {
    /// All five prayers in their fixed daily order.
    pub const ORDER: [Prayer; 5] = [
        Prayer::Subuh,
        Prayer::Dzuhur,
        Prayer::Ashar,
        Prayer::Maghrib,
        Prayer::Isya,
    ];

    /// Display name, which is also the daily-log column name.
    pub fn name(&self) -> &'static str {
        match self {
            Prayer::Subuh => "Subuh",
            Prayer::Dzuhur => "Dzuhur",
            Prayer::Ashar => "Ashar",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isya => "Isya",
        }
    }

    /// Canonical English name used by the schedule API.
    pub fn api_name(&self) -> &'static str {
        match self {
            Prayer::Subuh => "Fajr",
            Prayer::Dzuhur => "Dhuhr",
            Prayer::Ashar => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isya => "Isha",
        }
    }

    /// The prayer immediately before this one in the daily order.
    /// Subuh, being first, has none.
    pub fn predecessor(&self) -> Option<Prayer> {
        let idx = Prayer::ORDER.iter().position(|p| p == self)?;
        idx.checked_sub(1).map(|i| Prayer::ORDER[i])
    }

    /// Parse a display name back into a prayer.
    pub fn from_name(name: &str) -> Option<Prayer> {
        Prayer::ORDER.into_iter().find(|p| p.name() == name)
    }
}

/// Today's five prayer times plus the extra rows the schedule API returns,
/// all as "HH:MM" local clock strings. Fetched fresh every refresh cycle,
/// never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrayerSchedule {
    /// Human-readable date string from the upstream API.
    pub tanggal: String,
    pub imsak: String,
    pub subuh: String,
    pub terbit: String,
    pub dhuha: String,
    pub dzuhur: String,
    pub ashar: String,
    pub maghrib: String,
    pub isya: String,
}

impl PrayerSchedule {
    /// Raw "HH:MM" string for one of the five obligatory prayers.
    pub fn raw_time(&self, prayer: Prayer) -> &str {
        match prayer {
            Prayer::Subuh => &self.subuh,
            Prayer::Dzuhur => &self.dzuhur,
            Prayer::Ashar => &self.ashar,
            Prayer::Maghrib => &self.maghrib,
            Prayer::Isya => &self.isya,
        }
    }

    /// Parsed clock time for a prayer, or None if the upstream string is
    /// not "HH:MM".
    pub fn time_of(&self, prayer: Prayer) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.raw_time(prayer), "%H:%M").ok()
    }
}

// ──────────────────── Notification kinds ────────────────────

/// The six independently toggleable notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifKind {
    Sholat,
    Rangkuman,
    Dzikir,
    Dhuha,
    Jumat,
    Motivasi,
}

impl NotifKind {
    pub const ALL: [NotifKind; 6] = [
        NotifKind::Sholat,
        NotifKind::Rangkuman,
        NotifKind::Dzikir,
        NotifKind::Dhuha,
        NotifKind::Jumat,
        NotifKind::Motivasi,
    ];

    /// Kinds wired automatically when a user completes onboarding.
    pub const DEFAULTS: [NotifKind; 3] =
        [NotifKind::Sholat, NotifKind::Rangkuman, NotifKind::Motivasi];

    /// The users-table column holding this kind's flag.
    pub fn column(&self) -> &'static str {
        match self {
            NotifKind::Sholat => "notif_sholat",
            NotifKind::Rangkuman => "notif_rangkuman",
            NotifKind::Dzikir => "notif_dzikir",
            NotifKind::Dhuha => "notif_dhuha",
            NotifKind::Jumat => "notif_jumat",
            NotifKind::Motivasi => "notif_motivasi",
        }
    }

    /// Short key used in callback data (`toggle_notif_<key>`).
    pub fn key(&self) -> &'static str {
        match self {
            NotifKind::Sholat => "sholat",
            NotifKind::Rangkuman => "rangkuman",
            NotifKind::Dzikir => "dzikir",
            NotifKind::Dhuha => "dhuha",
            NotifKind::Jumat => "jumat",
            NotifKind::Motivasi => "motivasi",
        }
    }

    /// Label shown on the settings keyboard.
    pub fn label(&self) -> &'static str {
        match self {
            NotifKind::Sholat => "Waktu Sholat & Pengingat",
            NotifKind::Rangkuman => "Rangkuman Harian (21:30)",
            NotifKind::Dzikir => "Dzikir Pagi & Petang",
            NotifKind::Dhuha => "Sholat Dhuha (09:00)",
            NotifKind::Jumat => "Jumat (Al-Kahfi, 07:00)",
            NotifKind::Motivasi => "Motivasi Harian (07:00)",
        }
    }

    pub fn from_key(key: &str) -> Option<NotifKind> {
        NotifKind::ALL.into_iter().find(|k| k.key() == key)
    }
}

/// Morning or evening dzikir slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DzikirTime {
    Pagi,
    Petang,
}

impl DzikirTime {
    pub fn label(&self) -> &'static str {
        match self {
            DzikirTime::Pagi => "Pagi",
            DzikirTime::Petang => "Petang",
        }
    }
}

// ──────────────────── Users ────────────────────

/// Admin-driven approval state of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "Pending",
            UserStatus::Approved => "Approved",
            UserStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<UserStatus> {
        match s {
            "Pending" => Some(UserStatus::Pending),
            "Approved" => Some(UserStatus::Approved),
            "Rejected" => Some(UserStatus::Rejected),
            _ => None,
        }
    }
}

// ──────────────────── Conversation ────────────────────

/// One turn of a discussion conversation, role-tagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

// ──────────────────── Scripture references ────────────────────

/// A translated Qur'an verse with its original text and reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerseRef {
    pub text: String,
    pub arabic: String,
    /// e.g. "QS. Al-Baqarah: 153"
    pub reference: String,
}

/// A translated hadith with its narrator reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HadithRef {
    pub text: String,
    /// e.g. "HR. Bukhari No. 52"
    pub reference: String,
}

// ──────────────────── MarkdownV2 escaping ────────────────────

const MARKDOWN_V2_SPECIALS: &str = r"_*[]()~`>#+-=|{}.!";

/// Backslash-escape every MarkdownV2 special character in `text`.
///
/// Telegram rejects messages where these characters appear unescaped
/// outside of formatting entities, so every literal interpolation goes
/// through here.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_V2_SPECIALS.contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checklist_partition() {
        assert_eq!(CHECKLIST_ITEMS.len(), 16);
        for item in WAJIB_ITEMS.iter().chain(&SUNNAH_ITEMS).chain(&LAINNYA_ITEMS).chain(&FAST_ITEMS) {
            assert!(is_checklist_item(item), "{item} missing from catalogue");
        }
        assert!(!is_checklist_item("Ngopi"));
    }

    #[test]
    fn test_prayer_order_and_predecessor() {
        assert_eq!(Prayer::Subuh.predecessor(), None);
        assert_eq!(Prayer::Dzuhur.predecessor(), Some(Prayer::Subuh));
        assert_eq!(Prayer::Isya.predecessor(), Some(Prayer::Maghrib));
        assert_eq!(Prayer::from_name("Maghrib"), Some(Prayer::Maghrib));
        assert_eq!(Prayer::from_name("Fajr"), None);
        assert_eq!(Prayer::Subuh.api_name(), "Fajr");
    }

    #[test]
    fn test_schedule_time_parsing() {
        let sched = PrayerSchedule {
            tanggal: "Senin, 01/07/2024".into(),
            imsak: "04:20".into(),
            subuh: "04:30".into(),
            terbit: "05:45".into(),
            dhuha: "06:15".into(),
            dzuhur: "12:00".into(),
            ashar: "15:15".into(),
            maghrib: "18:00".into(),
            isya: "19:15".into(),
        };
        assert_eq!(
            sched.time_of(Prayer::Ashar),
            Some(NaiveTime::from_hms_opt(15, 15, 0).unwrap())
        );
        let mut broken = sched.clone();
        broken.isya = "-".into();
        assert_eq!(broken.time_of(Prayer::Isya), None);
    }

    #[test]
    fn test_notif_kind_roundtrip() {
        for kind in NotifKind::ALL {
            assert_eq!(NotifKind::from_key(kind.key()), Some(kind));
            assert!(kind.column().starts_with("notif_"));
        }
        assert_eq!(NotifKind::from_key("sholat"), Some(NotifKind::Sholat));
        assert_eq!(NotifKind::from_key("bogus"), None);
    }

    #[test]
    fn test_user_status_roundtrip() {
        for s in [UserStatus::Pending, UserStatus::Approved, UserStatus::Rejected] {
            assert_eq!(UserStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(UserStatus::from_str("approved"), None);
    }

    #[test]
    fn test_escape_specials() {
        assert_eq!(
            escape_markdown_v2("a_b*c[d]e(f)g~h`i>j#k+l-m=n|o{p}q.r!s"),
            r"a\_b\*c\[d\]e\(f\)g\~h\`i\>j\#k\+l\-m\=n\|o\{p\}q\.r\!s"
        );
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_markdown_v2("Jadwal Sholat Jakarta"), "Jadwal Sholat Jakarta");
        assert_eq!(escape_markdown_v2(""), "");
    }

    #[test]
    fn test_escape_every_special_once() {
        for ch in r"_*[]()~`>#+-=|{}.!".chars() {
            let escaped = escape_markdown_v2(&ch.to_string());
            assert_eq!(escaped, format!("\\{ch}"));
        }
    }
}
