//! Fixed bot copy. Raw strings here; escaping happens at the send site or
//! inline where the text is already MarkdownV2.

pub const MENU_SHOLAT: &str = "🕌 Waktu Sholat";
pub const MENU_CHECKLIST: &str = "📝 Checklist Ibadah Harian";
pub const MENU_LAPORAN: &str = "📊 Laporan Ibadah";
pub const MENU_NOTIFIKASI: &str = "🔔 Pengaturan Notifikasi";
pub const MENU_FEEDBACK: &str = "💌 Kritik dan Saran";
pub const MENU_DISKUSI: &str = "💬 Diskusi Islami";

pub const MAIN_MENU_LABELS: [&str; 6] = [
    MENU_SHOLAT,
    MENU_CHECKLIST,
    MENU_LAPORAN,
    MENU_NOTIFIKASI,
    MENU_FEEDBACK,
    MENU_DISKUSI,
];

pub const ASK_NAME: &str =
    "Assalamu'alaikum! 👋\nSelamat datang di Ibadah Bot.\n\nSebelum mendaftar, siapa nama lengkap Anda?";

pub const AWAITING_APPROVAL: &str =
    "Terima kasih! Pendaftaran Anda sudah dikirim ke admin untuk diverifikasi. Mohon tunggu ya. 🙏";

pub const REJECTED: &str =
    "Mohon maaf, pendaftaran Anda tidak dapat kami terima saat ini.";

pub const TERMS_AND_CONDITIONS: &str = "📜 Syarat dan Ketentuan Ibadah Bot\n\n\
1. Bot ini membantu Anda mencatat ibadah harian; kejujuran catatan sepenuhnya tanggung jawab Anda.\n\
2. Data yang tersimpan hanya dipakai untuk fitur bot (laporan, pengingat, dan motivasi personal).\n\
3. Jawaban fitur Diskusi Islami dihasilkan AI dari dalil yang ditemukan dan wajib divalidasi ke ustadz atau ahli fiqih.\n\
4. Admin dapat menonaktifkan akun yang disalahgunakan.\n\n\
Tekan tombol di bawah jika Anda setuju.";

pub const AGREE_BUTTON: &str = "✅ Saya Setuju";

pub const WELCOME_ACTIVE: &str =
    "Alhamdulillah, akun Anda aktif! Silakan pilih menu di bawah. 👇";

pub const ASK_LOCATION: &str =
    "Ketik nama kota Anda (contoh: Jakarta, Bandung, Surabaya) untuk jadwal sholat.";

pub const LOCATION_NOT_FOUND: &str =
    "Kota tidak ditemukan. Coba tulis nama kota atau kabupaten yang lain.";

pub const ASK_FEEDBACK: &str =
    "Silakan tulis kritik atau saran Anda dalam satu pesan. Ketik /cancel untuk batal.";

pub const FEEDBACK_THANKS: &str =
    "Jazakallahu khairan! Masukan Anda sudah kami teruskan ke admin. 💌";

pub const DISCUSSION_INTRO: &str = "💬 Mode Diskusi Islami aktif.\n\n\
Silakan ajukan pertanyaan seputar Islam; jawaban dirangkai dari Al-Qur'an dan hadis yang ditemukan.\n\
Ketik /selesai untuk mengakhiri diskusi.";

pub const DISCUSSION_DONE: &str =
    "Diskusi selesai dan riwayat percakapan dihapus. Barakallahu fiik. 🙏";

pub const CANCELLED: &str = "Baik, dibatalkan. Silakan pilih menu lagi. 👇";

pub const USE_MENU: &str =
    "Silakan gunakan tombol menu di bawah, atau ketik /start untuk memulai.";
