//! ibadah-api: HTTP client for the MyQuran API.
//!
//! Covers the three lookups the bot needs: city resolution + daily prayer
//! schedules, Qur'an keyword search, and hadith search across narrators.
//! "Not found" is a soft result (`Ok(None)`), never an error.

pub mod types;

use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use reqwest::Client;

use ibadah_types::{HadithRef, PrayerSchedule, VerseRef, escape_markdown_v2};

use types::{ApiResponse, AyatHit, CityHit, HadithData, ScheduleData, plain_number};

const DEFAULT_BASE_URL: &str = "https://api.myquran.com/v2";

/// Narrators searched for hadith, in no particular order.
const NARRATORS: [&str; 6] = ["bukhari", "muslim", "abu-daud", "tirmidzi", "nasai", "ibnu-majah"];

/// HTTP client for the MyQuran API.
pub struct MyQuranApi {
    client: Client,
    base_url: String,
}

impl MyQuranApi {
    /// Create a client against the public API with a request timeout.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a specific base URL (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Resolve a free-text city name to the API's internal id. Takes the
    /// first hit; an empty result is `Ok(None)`.
    pub async fn city_id(&self, city: &str) -> anyhow::Result<Option<String>> {
        let resp: ApiResponse<Vec<CityHit>> = self
            .client
            .get(format!("{}/sholat/kota/cari/{city}", self.base_url))
            .send()
            .await
            .context("city search request failed")?
            .json()
            .await
            .context("city search response parse failed")?;

        let Some(hits) = resp.data.filter(|_| resp.status) else {
            return Ok(None);
        };
        Ok(hits.into_iter().next().map(|h| h.id))
    }

    /// Today's prayer schedule for a city, or None if the city or the date
    /// has no schedule upstream.
    pub async fn prayer_schedule(
        &self,
        city: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<PrayerSchedule>> {
        let Some(city_id) = self.city_id(city).await? else {
            return Ok(None);
        };

        let url = format!(
            "{}/sholat/jadwal/{city_id}/{}/{}/{}",
            self.base_url,
            date.year(),
            date.month(),
            date.day()
        );
        let resp: ApiResponse<ScheduleData> = self
            .client
            .get(url)
            .send()
            .await
            .context("schedule request failed")?
            .json()
            .await
            .context("schedule response parse failed")?;

        let Some(data) = resp.data.filter(|_| resp.status) else {
            return Ok(None);
        };
        let j = data.jadwal;
        Ok(Some(PrayerSchedule {
            tanggal: j.tanggal,
            imsak: j.imsak,
            subuh: j.subuh,
            terbit: j.terbit,
            dhuha: j.dhuha,
            dzuhur: j.dzuhur,
            ashar: j.ashar,
            maghrib: j.maghrib,
            isya: j.isya,
        }))
    }

    /// Keyword search over Qur'an translations; picks one verse at random
    /// when several match.
    pub async fn search_quran(&self, keyword: &str) -> anyhow::Result<Option<VerseRef>> {
        let url = format!(
            "{}/quran/ayat/keyword/{keyword}/terjemah/semua",
            self.base_url
        );
        let resp: ApiResponse<Vec<AyatHit>> = self
            .client
            .get(url)
            .send()
            .await
            .context("quran search request failed")?
            .json()
            .await
            .context("quran search response parse failed")?;

        let Some(hits) = resp.data.filter(|_| resp.status) else {
            return Ok(None);
        };
        let Some(ayat) = hits.choose(&mut rand::thread_rng()) else {
            return Ok(None);
        };
        Ok(Some(VerseRef {
            text: ayat.terjemah.teks.clone(),
            arabic: ayat.teks.arab.clone(),
            reference: format!("QS. {}: {}", ayat.surat.nama.id, plain_number(&ayat.nomor)),
        }))
    }

    /// Keyword search for a hadith, trying narrators in random order until
    /// one returns a match; picks one hit at random.
    pub async fn search_hadith(&self, keyword: &str) -> anyhow::Result<Option<HadithRef>> {
        let mut narrators = NARRATORS;
        narrators.shuffle(&mut rand::thread_rng());

        for narrator in narrators {
            let url = format!(
                "{}/hadits/{narrator}/cari?q={keyword}&limit=5",
                self.base_url
            );
            let resp: Result<ApiResponse<HadithData>, _> = async {
                self.client
                    .get(&url)
                    .send()
                    .await
                    .context("hadith search request failed")?
                    .json::<ApiResponse<HadithData>>()
                    .await
                    .context("hadith search response parse failed")
            }
            .await;

            let resp = match resp {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(narrator, "hadith search failed: {e:#}");
                    continue;
                }
            };
            let Some(data) = resp.data.filter(|_| resp.status) else {
                continue;
            };
            if let Some(hit) = data.hadits.choose(&mut rand::thread_rng()) {
                return Ok(Some(HadithRef {
                    text: hit.terjemah.clone(),
                    reference: format!(
                        "HR. {} No. {}",
                        capitalize(narrator),
                        plain_number(&hit.nomor)
                    ),
                }));
            }
        }
        Ok(None)
    }
}

impl Default for MyQuranApi {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Render a schedule as a MarkdownV2 message, with every literal escaped.
pub fn format_schedule(city: &str, schedule: &PrayerSchedule, now_clock: &str) -> String {
    let safe_city = escape_markdown_v2(city);
    let safe_date = escape_markdown_v2(&schedule.tanggal);
    format!(
        "🕋 *Jadwal Sholat untuk {safe_city}*\n\
         🗓️ Tanggal: {safe_date}\n\
         🕰️ Waktu Sekarang: `{now_clock}` WIB\n\n\
         *Imsak:* `{}`\n\
         *Subuh:* `{}`\n\
         *Terbit:* `{}`\n\
         *Dhuha:* `{}`\n\
         *Dzuhur:* `{}`\n\
         *Ashar:* `{}`\n\
         *Maghrib:* `{}`\n\
         *Isya:* `{}`",
        schedule.imsak,
        schedule.subuh,
        schedule.terbit,
        schedule.dhuha,
        schedule.dzuhur,
        schedule.ashar,
        schedule.maghrib,
        schedule.isya,
    )
}
