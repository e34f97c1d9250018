//! Inline and reply keyboard builders.

use chrono::NaiveDate;

use ibadah_db::{DailyLog, NotifFlags};
use ibadah_telegram::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, ReplyKeyboardMarkup,
};
use ibadah_types::{LAINNYA_ITEMS, NotifKind, SUNNAH_ITEMS, WAJIB_ITEMS, hijri};

/// The persistent main menu.
pub fn main_menu() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup::rows(&crate::texts::MAIN_MENU_LABELS)
}

/// Inline Approve/Reject pair for the admin review message.
pub fn admin_review(user_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton::new("✅ Terima", format!("approve_{user_id}")),
            InlineKeyboardButton::new("❌ Tolak", format!("reject_{user_id}")),
        ]],
    }
}

/// Single agree button under the terms message.
pub fn agree_terms(user_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::new(
            crate::texts::AGREE_BUTTON,
            format!("agree_terms_{user_id}"),
        )]],
    }
}

/// "Change location" button under a schedule message.
pub fn change_location() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::new(
            "📍 Ganti Lokasi",
            "change_location",
        )]],
    }
}

/// Checklist category picker.
pub fn checklist_categories() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::new("🕌 Ibadah Wajib", "checklist_cat_wajib")],
            vec![InlineKeyboardButton::new("✨ Ibadah Sunnah", "checklist_cat_sunnah")],
            vec![InlineKeyboardButton::new("💖 Ibadah Lainnya", "checklist_cat_lainnya")],
        ],
    }
}

/// Items of one checklist category. The "lainnya" category is extended
/// with whatever seasonal fasts apply today.
pub fn category_items(category: &str, date: NaiveDate) -> Option<Vec<&'static str>> {
    match category {
        "wajib" => Some(WAJIB_ITEMS.to_vec()),
        "sunnah" => Some(SUNNAH_ITEMS.to_vec()),
        "lainnya" => {
            let mut items = LAINNYA_ITEMS.to_vec();
            items.extend(hijri::sunnah_fasts_for(date));
            Some(items)
        }
        _ => None,
    }
}

/// Two-column toggle keyboard for a category, with the item's current
/// state marked, plus a back row.
pub fn checklist_items(category: &str, items: &[&'static str], log: &DailyLog) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for pair in items.chunks(2) {
        let row = pair
            .iter()
            .map(|item| {
                let mark = if log.is_done(item) { "✅" } else { "❌" };
                InlineKeyboardButton::new(
                    format!("{mark} {item}"),
                    format!("checklist_{category}_{item}"),
                )
            })
            .collect();
        rows.push(row);
    }
    rows.push(vec![InlineKeyboardButton::new(
        "⬅️ Kembali",
        "back_to_categories",
    )]);
    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

/// Report period picker.
pub fn report_periods() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton::new("Harian", "laporan_harian"),
            InlineKeyboardButton::new("Mingguan", "laporan_mingguan"),
            InlineKeyboardButton::new("Bulanan", "laporan_bulanan"),
        ]],
    }
}

/// Per-kind notification toggles with their current state.
pub fn notification_settings(flags: &NotifFlags) -> InlineKeyboardMarkup {
    let rows = NotifKind::ALL
        .into_iter()
        .map(|kind| {
            let mark = if flags.get(kind) { "✅" } else { "🔕" };
            vec![InlineKeyboardButton::new(
                format!("{mark} {}", kind.label()),
                format!("toggle_notif_{}", kind.key()),
            )]
        })
        .collect();
    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use ibadah_types::{CHECKLIST_ITEMS, STATUS_DONE, STATUS_PENDING};

    fn log(done: &[&str]) -> DailyLog {
        let mut items = HashMap::new();
        for item in CHECKLIST_ITEMS {
            let status = if done.contains(&item) { STATUS_DONE } else { STATUS_PENDING };
            items.insert(item.to_string(), status.to_string());
        }
        DailyLog {
            user_id: 1,
            date: "2024-07-01".into(),
            items,
        }
    }

    #[test]
    fn test_category_items() {
        let date = NaiveDate::from_ymd_opt(2023, 8, 1).unwrap();
        assert_eq!(category_items("wajib", date).unwrap().len(), 5);
        assert_eq!(category_items("sunnah", date).unwrap().len(), 3);
        assert!(category_items("puasa", date).is_none());
    }

    #[test]
    fn test_lainnya_includes_seasonal_fasts() {
        // 2023-08-01 = 14 Muharram 1445, an Ayyamul Bidh day.
        let date = NaiveDate::from_ymd_opt(2023, 8, 1).unwrap();
        let items = category_items("lainnya", date).unwrap();
        assert!(items.contains(&"Tilawah"));
        assert!(items.contains(&"Puasa Ayyamul Bidh"));
        // A plain Friday has no extra fasts.
        let friday = NaiveDate::from_ymd_opt(2023, 8, 4).unwrap();
        assert_eq!(category_items("lainnya", friday).unwrap().len(), 3);
    }

    #[test]
    fn test_checklist_two_column_layout() {
        let items = category_items("wajib", NaiveDate::from_ymd_opt(2024, 7, 2).unwrap()).unwrap();
        let markup = checklist_items("wajib", &items, &log(&["Subuh"]));
        // 5 items → 2 + 2 + 1 rows, plus the back row.
        assert_eq!(markup.inline_keyboard.len(), 4);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[2].len(), 1);

        let subuh = &markup.inline_keyboard[0][0];
        assert_eq!(subuh.text, "✅ Subuh");
        assert_eq!(subuh.callback_data, "checklist_wajib_Subuh");
        let dzuhur = &markup.inline_keyboard[0][1];
        assert_eq!(dzuhur.text, "❌ Dzuhur");

        let back = &markup.inline_keyboard[3][0];
        assert_eq!(back.callback_data, "back_to_categories");
    }

    #[test]
    fn test_notification_settings_marks_state() {
        let flags = NotifFlags {
            sholat: true,
            rangkuman: false,
            dzikir: true,
            dhuha: true,
            jumat: true,
            motivasi: true,
        };
        let markup = notification_settings(&flags);
        assert_eq!(markup.inline_keyboard.len(), 6);
        assert!(markup.inline_keyboard[0][0].text.starts_with("✅"));
        assert!(markup.inline_keyboard[1][0].text.starts_with("🔕"));
        assert_eq!(
            markup.inline_keyboard[1][0].callback_data,
            "toggle_notif_rangkuman"
        );
    }

    #[test]
    fn test_main_menu_one_label_per_row() {
        let menu = main_menu();
        assert_eq!(menu.keyboard.len(), crate::texts::MAIN_MENU_LABELS.len());
    }
}
