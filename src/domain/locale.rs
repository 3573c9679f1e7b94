//! Locale helpers for bot messages.
//!
//! Digit localisation for Farsi and Arabic, and rendering of a timestamp in
//! the Gregorian and Jalali calendars plus a relative "N units ago" phrase.
//! All calendar arithmetic is done in UTC.

use crate::domain::jalali::JalaliDate;
use crate::domain::record::Timestamp;
use chrono::{DateTime, Months, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

const FA_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];
const AR_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];
const ARABIC_DECIMAL_SEPARATOR: char = '\u{066B}';

/// Message language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    En,
    Fa,
    Ar,
}

impl Lang {
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Fa => "fa",
            Lang::Ar => "ar",
        }
    }

    fn digits(&self) -> Option<&'static [char; 10]> {
        match self {
            Lang::En => None,
            Lang::Fa => Some(&FA_DIGITS),
            Lang::Ar => Some(&AR_DIGITS),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error for language codes other than `en`, `fa` and `ar`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code `{0}`")]
pub struct UnknownLang(pub String);

impl FromStr for Lang {
    type Err = UnknownLang;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Lang::En),
            "fa" => Ok(Lang::Fa),
            "ar" => Ok(Lang::Ar),
            _ => Err(UnknownLang(s.to_string())),
        }
    }
}

/// Replace ASCII digits with their Farsi or Arabic equivalents.
///
/// When `convert_decimal_point` is set, `.` becomes the Arabic decimal
/// separator (U+066B). Input for [`Lang::En`] is returned unchanged.
///
/// # Example
/// ```
/// use skoocheh::{localize_digits, Lang};
///
/// assert_eq!(localize_digits("v2.5", Lang::Fa, false), "v۲.۵");
/// assert_eq!(localize_digits("v2.5", Lang::En, true), "v2.5");
/// ```
pub fn localize_digits(input: &str, lang: Lang, convert_decimal_point: bool) -> String {
    let Some(digits) = lang.digits() else {
        return input.to_string();
    };

    input
        .chars()
        .map(|c| match c {
            '0'..='9' => digits[(c as u8 - b'0') as usize],
            '.' if convert_decimal_point => ARABIC_DECIMAL_SEPARATOR,
            other => other,
        })
        .collect()
}

/// Largest non-zero calendar unit between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTime {
    Years(u32),
    Months(u32),
    Days(i64),
    Hours(i64),
    Minutes(i64),
    Seconds(i64),
    Now,
}

impl RelativeTime {
    /// Calendar difference from `then` to `now`.
    ///
    /// Months are added with end-of-month clamping, so 31 Jan → 28 Feb is one
    /// month. Future instants count as [`RelativeTime::Now`].
    pub fn between(then: NaiveDateTime, now: NaiveDateTime) -> Self {
        if then >= now {
            return RelativeTime::Now;
        }

        let mut months = months_between(then, now);
        let anchor = loop {
            match then.checked_add_months(Months::new(months)) {
                Some(anchor) if anchor <= now => break anchor,
                _ if months == 0 => break then,
                _ => months -= 1,
            }
        };

        let (years, months) = (months / 12, months % 12);
        let rest = now - anchor;

        if years > 0 {
            RelativeTime::Years(years)
        } else if months > 0 {
            RelativeTime::Months(months)
        } else if rest.num_days() > 0 {
            RelativeTime::Days(rest.num_days())
        } else if rest.num_hours() > 0 {
            RelativeTime::Hours(rest.num_hours())
        } else if rest.num_minutes() > 0 {
            RelativeTime::Minutes(rest.num_minutes())
        } else if rest.num_seconds() > 0 {
            RelativeTime::Seconds(rest.num_seconds())
        } else {
            RelativeTime::Now
        }
    }

    /// English phrase, e.g. "3 days ago" or "an hour ago".
    pub fn english(&self) -> String {
        let (count, singular, unit) = match *self {
            RelativeTime::Years(n) => (n as i64, "a year", "years"),
            RelativeTime::Months(n) => (n as i64, "a month", "months"),
            RelativeTime::Days(n) => (n, "a day", "days"),
            RelativeTime::Hours(n) => (n, "an hour", "hours"),
            RelativeTime::Minutes(n) => (n, "a minute", "minutes"),
            RelativeTime::Seconds(n) => (n, "a second", "seconds"),
            RelativeTime::Now => return "right now".to_string(),
        };
        if count == 1 {
            format!("{singular} ago")
        } else {
            format!("{count} {unit} ago")
        }
    }

    /// Farsi phrase with Farsi digits, e.g. "۳ روز پیش" or "یک ساعت پیش".
    pub fn farsi(&self) -> String {
        let (count, unit) = match *self {
            RelativeTime::Years(n) => (n as i64, "سال"),
            RelativeTime::Months(n) => (n as i64, "ماه"),
            RelativeTime::Days(n) => (n, "روز"),
            RelativeTime::Hours(n) => (n, "ساعت"),
            RelativeTime::Minutes(n) => (n, "دقیقه"),
            RelativeTime::Seconds(n) => (n, "ثانیه"),
            RelativeTime::Now => return "همین الان".to_string(),
        };
        if count == 1 {
            format!("یک {unit} پیش")
        } else {
            localize_digits(&format!("{count} {unit} پیش"), Lang::Fa, false)
        }
    }
}

fn months_between(then: NaiveDateTime, now: NaiveDateTime) -> u32 {
    use chrono::Datelike;
    let months = (now.year() - then.year()) * 12 + now.month() as i32 - then.month() as i32;
    months.max(0) as u32
}

/// One instant rendered for every audience the bot talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiDate {
    /// `YYYY-MM-DD HH:MM:SS`
    pub gregorian: String,
    /// `YYYY-MM-DD`
    pub gregorian_short: String,
    /// Weekday, day, month name, year and time in Farsi
    pub jalali: String,
    /// `Y/M/D` with Farsi digits
    pub jalali_short: String,
    pub relative_en: String,
    pub relative_fa: String,
}

impl MultiDate {
    /// Render `at` relative to `now`.
    ///
    /// Returns `None` for timestamps at or before the epoch, or outside the
    /// range chrono can represent.
    pub fn from_timestamp(at: Timestamp, now: Timestamp) -> Option<Self> {
        if at <= Timestamp::EPOCH {
            return None;
        }
        let at = to_datetime(at)?;
        let now = to_datetime(now)?;

        let jalali_date = JalaliDate::from_gregorian(at.date_naive());
        let time = at.format("%H:%M:%S").to_string();
        let jalali = format!(
            "{}ء {} {} {} {}",
            jalali_date.weekday_name(),
            jalali_date.day(),
            jalali_date.month_name(),
            jalali_date.year(),
            time
        );
        let relative = RelativeTime::between(at.naive_utc(), now.naive_utc());

        Some(Self {
            gregorian: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            gregorian_short: at.format("%Y-%m-%d").to_string(),
            jalali: localize_digits(&jalali, Lang::Fa, false),
            jalali_short: localize_digits(&jalali_date.to_string(), Lang::Fa, false),
            relative_en: relative.english(),
            relative_fa: relative.farsi(),
        })
    }
}

fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    let secs = ts.as_secs_f64();
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_localize_digits() {
        assert_eq!(localize_digits("2024", Lang::Fa, false), "۲۰۲۴");
        assert_eq!(localize_digits("2024", Lang::Ar, false), "٢٠٢٤");
        assert_eq!(localize_digits("1.5", Lang::Fa, true), "۱\u{066B}۵");
        assert_eq!(localize_digits("1.5", Lang::Fa, false), "۱.۵");
        assert_eq!(localize_digits("abc", Lang::Ar, true), "abc");
    }

    #[test]
    fn test_lang_from_str() {
        assert_eq!("FA".parse::<Lang>(), Ok(Lang::Fa));
        assert_eq!("ar".parse::<Lang>(), Ok(Lang::Ar));
        assert_eq!(
            "de".parse::<Lang>(),
            Err(UnknownLang("de".to_string()))
        );
    }

    #[test]
    fn test_relative_units() {
        let now = at(2024, 6, 15, 12, 0, 0);
        assert_eq!(
            RelativeTime::between(at(2022, 6, 15, 12, 0, 0), now),
            RelativeTime::Years(2)
        );
        assert_eq!(
            RelativeTime::between(at(2024, 3, 20, 12, 0, 0), now),
            RelativeTime::Months(2)
        );
        assert_eq!(
            RelativeTime::between(at(2024, 6, 10, 13, 0, 0), now),
            RelativeTime::Days(4)
        );
        assert_eq!(
            RelativeTime::between(at(2024, 6, 15, 9, 30, 0), now),
            RelativeTime::Hours(2)
        );
        assert_eq!(
            RelativeTime::between(at(2024, 6, 15, 11, 59, 15), now),
            RelativeTime::Seconds(45)
        );
        assert_eq!(RelativeTime::between(now, now), RelativeTime::Now);
    }

    #[test]
    fn test_relative_month_is_calendar_based() {
        // 31 Jan + 1 month clamps to 29 Feb (2024 is a leap year).
        let then = at(2024, 1, 31, 0, 0, 0);
        assert_eq!(
            RelativeTime::between(then, at(2024, 2, 29, 0, 0, 0)),
            RelativeTime::Months(1)
        );
        assert_eq!(
            RelativeTime::between(then, at(2024, 2, 28, 0, 0, 0)),
            RelativeTime::Days(28)
        );
    }

    #[test]
    fn test_relative_phrases() {
        assert_eq!(RelativeTime::Years(1).english(), "a year ago");
        assert_eq!(RelativeTime::Hours(1).english(), "an hour ago");
        assert_eq!(RelativeTime::Days(3).english(), "3 days ago");
        assert_eq!(RelativeTime::Now.english(), "right now");

        assert_eq!(RelativeTime::Days(1).farsi(), "یک روز پیش");
        assert_eq!(RelativeTime::Minutes(12).farsi(), "۱۲ دقیقه پیش");
        assert_eq!(RelativeTime::Now.farsi(), "همین الان");
    }

    #[test]
    fn test_multi_date() {
        // 2024-03-20 08:30:00 UTC, Nowruz 1403 (a Wednesday).
        let ts = Timestamp::from_secs_f64(1_710_923_400.0);
        let now = Timestamp::from_secs_f64(1_710_923_400.0 + 3.0 * 86_400.0);
        let date = MultiDate::from_timestamp(ts, now).unwrap();

        assert_eq!(date.gregorian, "2024-03-20 08:30:00");
        assert_eq!(date.gregorian_short, "2024-03-20");
        assert_eq!(date.jalali_short, "۱۴۰۳/۱/۱");
        assert_eq!(date.jalali, "چهارشنبهء ۱ فروردین ۱۴۰۳ ۰۸:۳۰:۰۰");
        assert_eq!(date.relative_en, "3 days ago");
        assert_eq!(date.relative_fa, "۳ روز پیش");
    }

    #[test]
    fn test_multi_date_rejects_epoch() {
        let now = Timestamp::from_secs_f64(1000.0);
        assert_eq!(MultiDate::from_timestamp(Timestamp::EPOCH, now), None);
        assert_eq!(
            MultiDate::from_timestamp(Timestamp::from_secs_f64(-5.0), now),
            None
        );
    }
}
