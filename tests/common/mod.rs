//! Shared fixture: the fifty states with 2007-era populations
#![allow(dead_code)]

use rowdex::{Row, Table, Value};

/// `(name, abbr, inducted, population, capital, region)`
pub const STATES: &[(&str, &str, i64, i64, &str, &str)] = &[
    ("Delaware", "DE", 1787, 864_764, "Dover", "Northeast"),
    ("Pennsylvania", "PA", 1787, 12_432_792, "Harrisburg", "Northeast"),
    ("New Jersey", "NJ", 1787, 8_685_920, "Trenton", "Northeast"),
    ("Georgia", "GA", 1788, 9_544_750, "Atlanta", "South"),
    ("Connecticut", "CT", 1788, 3_502_309, "Hartford", "Northeast"),
    ("Massachusetts", "MA", 1788, 6_449_755, "Boston", "Northeast"),
    ("Maryland", "MD", 1788, 5_618_344, "Annapolis", "Northeast"),
    ("South Carolina", "SC", 1788, 4_407_709, "Columbia", "South"),
    ("New Hampshire", "NH", 1788, 1_315_828, "Concord", "Northeast"),
    ("Virginia", "VA", 1788, 7_712_091, "Richmond", "South"),
    ("New York", "NY", 1788, 19_297_729, "Albany", "Northeast"),
    ("North Carolina", "NC", 1789, 9_061_032, "Raleigh", "South"),
    ("Rhode Island", "RI", 1790, 1_057_832, "Providence", "Northeast"),
    ("Vermont", "VT", 1791, 621_254, "Montpelier", "Northeast"),
    ("Kentucky", "KY", 1792, 4_241_474, "Frankfort", "South"),
    ("Tennessee", "TN", 1796, 6_156_719, "Nashville", "South"),
    ("Ohio", "OH", 1803, 11_466_917, "Columbus", "Midwest"),
    ("Louisiana", "LA", 1812, 4_293_204, "Baton Rouge", "South"),
    ("Indiana", "IN", 1816, 6_345_289, "Indianapolis", "Midwest"),
    ("Mississippi", "MS", 1817, 2_918_785, "Jackson", "South"),
    ("Illinois", "IL", 1818, 12_852_548, "Springfield", "Midwest"),
    ("Alabama", "AL", 1819, 4_627_851, "Montgomery", "South"),
    ("Maine", "ME", 1820, 1_317_207, "Augusta", "Northeast"),
    ("Missouri", "MO", 1821, 5_878_415, "Jefferson City", "Midwest"),
    ("Arkansas", "AR", 1836, 2_834_797, "Little Rock", "South"),
    ("Michigan", "MI", 1837, 10_071_822, "Lansing", "Midwest"),
    ("Florida", "FL", 1845, 18_251_243, "Tallahassee", "South"),
    ("Texas", "TX", 1845, 23_904_380, "Austin", "Southwest"),
    ("Iowa", "IA", 1846, 2_988_046, "Des Moines", "Midwest"),
    ("Wisconsin", "WI", 1848, 5_601_640, "Madison", "Midwest"),
    ("California", "CA", 1850, 36_553_215, "Sacramento", "West"),
    ("Minnesota", "MN", 1858, 5_197_621, "St. Paul", "Midwest"),
    ("Oregon", "OR", 1859, 3_747_455, "Salem", "West"),
    ("Kansas", "KS", 1861, 2_775_997, "Topeka", "Midwest"),
    ("West Virginia", "WV", 1863, 1_812_035, "Charleston", "South"),
    ("Nevada", "NV", 1864, 2_565_382, "Carson City", "West"),
    ("Nebraska", "NE", 1867, 1_774_571, "Lincoln", "Midwest"),
    ("Colorado", "CO", 1876, 4_861_515, "Denver", "West"),
    ("North Dakota", "ND", 1889, 639_715, "Bismarck", "Midwest"),
    ("South Dakota", "SD", 1889, 796_214, "Pierre", "Midwest"),
    ("Montana", "MT", 1889, 957_861, "Helena", "West"),
    ("Washington", "WA", 1889, 6_468_424, "Olympia", "West"),
    ("Idaho", "ID", 1890, 1_499_402, "Boise", "West"),
    ("Wyoming", "WY", 1890, 522_830, "Cheyenne", "West"),
    ("Utah", "UT", 1896, 2_645_330, "Salt Lake City", "West"),
    ("Oklahoma", "OK", 1907, 3_617_316, "Oklahoma City", "Southwest"),
    ("New Mexico", "NM", 1912, 2_059_179, "Santa Fe", "Southwest"),
    ("Arizona", "AZ", 1912, 6_338_755, "Phoenix", "Southwest"),
    ("Alaska", "AK", 1959, 683_478, "Juneau", "Pacific"),
    ("Hawaii", "HI", 1959, 1_283_388, "Honolulu", "Pacific"),
];

pub const COLUMNS: [&str; 7] = [
    "id",
    "name",
    "abbr",
    "inducted",
    "population",
    "capital",
    "region",
];

pub fn state_rows() -> Vec<Row> {
    STATES
        .iter()
        .enumerate()
        .map(|(i, (name, abbr, inducted, population, capital, region))| {
            let mut row = Row::new();
            row.set("id", (i + 1) as i64);
            row.set("name", *name);
            row.set("abbr", *abbr);
            row.set("inducted", *inducted);
            row.set("population", *population);
            row.set("capital", *capital);
            row.set("region", *region);
            row
        })
        .collect()
}

pub fn states_table() -> Table {
    let mut table = Table::new(COLUMNS).expect("fixture columns are valid");
    table.insert(state_rows()).expect("fixture rows insert");
    table
}

/// Sorted abbreviations of a result set, for order-insensitive compares
pub fn abbrs(rows: &[Row]) -> Vec<String> {
    let mut out: Vec<String> = rows.iter().map(|r| r.get("abbr").to_string()).collect();
    out.sort();
    out
}

pub fn population_of(rows: &[Row], abbr: &str) -> Option<i64> {
    rows.iter()
        .find(|r| r.get("abbr") == &Value::from(abbr))
        .and_then(|r| match r.get("population") {
            Value::Int(v) => Some(*v),
            _ => None,
        })
}
