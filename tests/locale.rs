use skoocheh::{
    checksum_bytes, content_checksum, localize_digits, JalaliDate, Lang, MultiDate, Timestamp,
};
use std::io::Cursor;

#[test]
fn test_checksum_of_large_reader_matches_slice() {
    // Spans several read chunks.
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    let streamed = content_checksum(Cursor::new(&data)).unwrap();
    assert_eq!(streamed, checksum_bytes(&data));
    assert_eq!(streamed.len(), 64);
}

#[test]
fn test_multi_date_across_jalali_new_year() {
    // 2025-03-20 23:59:59 UTC is the last day of 1403.
    let last = Timestamp::from_secs_f64(1_742_515_199.0);
    let first = Timestamp::from_secs_f64(1_742_515_200.0);

    let before = MultiDate::from_timestamp(last, first).unwrap();
    let after = MultiDate::from_timestamp(first, first).unwrap();

    assert_eq!(before.jalali_short, localize_digits("1403/12/30", Lang::Fa, false));
    assert_eq!(after.jalali_short, localize_digits("1404/1/1", Lang::Fa, false));
    assert_eq!(before.relative_en, "a second ago");
    assert_eq!(after.relative_en, "right now");
}

#[test]
fn test_jalali_display() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let jalali = JalaliDate::from_gregorian(date);
    assert_eq!(jalali.to_string(), "1403/1/1");
    assert_eq!(jalali.month_name(), "فروردین");
}
