//! MyQuran API response payloads (minimal subset).

use serde::Deserialize;

/// Generic MyQuran response wrapper.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub data: Option<T>,
}

/// One hit from the city search endpoint.
#[derive(Debug, Deserialize)]
pub struct CityHit {
    pub id: String,
    pub lokasi: String,
}

/// Payload of the daily schedule endpoint.
#[derive(Debug, Deserialize)]
pub struct ScheduleData {
    pub jadwal: Jadwal,
}

/// The schedule rows as returned upstream, all "HH:MM" strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Jadwal {
    #[serde(default)]
    pub tanggal: String,
    #[serde(default)]
    pub imsak: String,
    #[serde(default)]
    pub subuh: String,
    #[serde(default)]
    pub terbit: String,
    #[serde(default)]
    pub dhuha: String,
    #[serde(default)]
    pub dzuhur: String,
    #[serde(default)]
    pub ashar: String,
    #[serde(default)]
    pub maghrib: String,
    #[serde(default)]
    pub isya: String,
}

/// One verse hit from the Qur'an keyword search.
#[derive(Debug, Deserialize)]
pub struct AyatHit {
    pub nomor: serde_json::Value,
    pub teks: AyatText,
    pub terjemah: AyatTranslation,
    pub surat: Surah,
}

#[derive(Debug, Deserialize)]
pub struct AyatText {
    pub arab: String,
}

#[derive(Debug, Deserialize)]
pub struct AyatTranslation {
    pub teks: String,
}

#[derive(Debug, Deserialize)]
pub struct Surah {
    pub nama: SurahName,
}

#[derive(Debug, Deserialize)]
pub struct SurahName {
    /// Indonesian surah name.
    pub id: String,
}

/// Payload of the hadith search endpoint.
#[derive(Debug, Deserialize)]
pub struct HadithData {
    #[serde(default)]
    pub hadits: Vec<HadithHit>,
}

#[derive(Debug, Deserialize)]
pub struct HadithHit {
    pub terjemah: String,
    pub nomor: serde_json::Value,
}

/// Render a JSON value that may be a number or string as plain text.
pub fn plain_number(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_search_parse() {
        let json = r#"{"status":true,"data":[{"id":"1204","lokasi":"KOTA JAKARTA"}]}"#;
        let resp: ApiResponse<Vec<CityHit>> = serde_json::from_str(json).unwrap();
        assert!(resp.status);
        let hits = resp.data.unwrap();
        assert_eq!(hits[0].id, "1204");
        assert_eq!(hits[0].lokasi, "KOTA JAKARTA");
    }

    #[test]
    fn test_city_search_empty() {
        let json = r#"{"status":false,"data":null}"#;
        let resp: ApiResponse<Vec<CityHit>> = serde_json::from_str(json).unwrap();
        assert!(!resp.status);
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_schedule_parse() {
        let json = r#"{
            "status": true,
            "data": {
                "id": 1204,
                "lokasi": "KOTA JAKARTA",
                "jadwal": {
                    "tanggal": "Senin, 01/07/2024",
                    "imsak": "04:32",
                    "subuh": "04:42",
                    "terbit": "06:00",
                    "dhuha": "06:29",
                    "dzuhur": "11:59",
                    "ashar": "15:21",
                    "maghrib": "17:52",
                    "isya": "19:06"
                }
            }
        }"#;
        let resp: ApiResponse<ScheduleData> = serde_json::from_str(json).unwrap();
        let jadwal = resp.data.unwrap().jadwal;
        assert_eq!(jadwal.subuh, "04:42");
        assert_eq!(jadwal.isya, "19:06");
        assert_eq!(jadwal.tanggal, "Senin, 01/07/2024");
    }

    #[test]
    fn test_ayat_parse() {
        let json = r#"{
            "status": true,
            "data": [{
                "nomor": 153,
                "teks": {"arab": "يَا أَيُّهَا الَّذِينَ آمَنُوا"},
                "terjemah": {"teks": "Wahai orang-orang yang beriman!"},
                "surat": {"nama": {"id": "Al-Baqarah"}}
            }]
        }"#;
        let resp: ApiResponse<Vec<AyatHit>> = serde_json::from_str(json).unwrap();
        let hits = resp.data.unwrap();
        assert_eq!(plain_number(&hits[0].nomor), "153");
        assert_eq!(hits[0].surat.nama.id, "Al-Baqarah");
    }

    #[test]
    fn test_hadith_parse() {
        let json = r#"{
            "status": true,
            "data": {"hadits": [{"terjemah": "Amal tergantung niat", "nomor": "1"}]}
        }"#;
        let resp: ApiResponse<HadithData> = serde_json::from_str(json).unwrap();
        let hadits = resp.data.unwrap().hadits;
        assert_eq!(plain_number(&hadits[0].nomor), "1");
    }
}
