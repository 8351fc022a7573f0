//! The 17 top-level administrative regions and distance helpers.
//!
//! The upstream holdings endpoint filters by region code, so GPS coordinates
//! are mapped to the nearest region centers before querying.

/// One administrative region with a representative center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Upstream region code (`region` query parameter).
    pub code: &'static str,
    /// English display name.
    pub name: &'static str,
    /// Korean name.
    pub korean: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// All 17 regions, ordered by upstream code.
pub const REGIONS: [Region; 17] = [
    Region { code: "11", name: "Seoul", korean: "서울", lat: 37.5665, lon: 126.9780 },
    Region { code: "21", name: "Busan", korean: "부산", lat: 35.1796, lon: 129.0756 },
    Region { code: "22", name: "Daegu", korean: "대구", lat: 35.8714, lon: 128.6014 },
    Region { code: "23", name: "Incheon", korean: "인천", lat: 37.4563, lon: 126.7052 },
    Region { code: "24", name: "Gwangju", korean: "광주", lat: 35.1595, lon: 126.8526 },
    Region { code: "25", name: "Daejeon", korean: "대전", lat: 36.3504, lon: 127.3845 },
    Region { code: "26", name: "Ulsan", korean: "울산", lat: 35.5384, lon: 129.3114 },
    Region { code: "29", name: "Sejong", korean: "세종", lat: 36.4800, lon: 127.2890 },
    Region { code: "31", name: "Gyeonggi", korean: "경기", lat: 37.4138, lon: 127.5183 },
    Region { code: "32", name: "Gangwon", korean: "강원", lat: 37.8228, lon: 128.1555 },
    Region { code: "33", name: "Chungbuk", korean: "충북", lat: 36.6357, lon: 127.4917 },
    Region { code: "34", name: "Chungnam", korean: "충남", lat: 36.6588, lon: 126.6728 },
    Region { code: "35", name: "Jeonbuk", korean: "전북", lat: 35.7175, lon: 127.1530 },
    Region { code: "36", name: "Jeonnam", korean: "전남", lat: 34.8161, lon: 126.4629 },
    Region { code: "37", name: "Gyeongbuk", korean: "경북", lat: 36.4919, lon: 128.8889 },
    Region { code: "38", name: "Gyeongnam", korean: "경남", lat: 35.4606, lon: 128.2132 },
    Region { code: "39", name: "Jeju", korean: "제주", lat: 33.4996, lon: 126.5312 },
];

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two WGS84 points, in kilometers.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// The `count` regions whose centers are closest to the given point,
/// nearest first. Ties keep table order.
#[must_use]
pub fn nearest_regions(lat: f64, lon: f64, count: usize) -> Vec<Region> {
    let mut scored: Vec<(f64, Region)> = REGIONS
        .iter()
        .map(|r| (haversine_km(lat, lon, r.lat, r.lon), *r))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().take(count).map(|(_, r)| r).collect()
}
