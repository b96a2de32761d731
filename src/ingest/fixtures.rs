/// Test fixtures: representative JSON payloads from the upstream APIs.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the parsers and normalizers. Values that upstreams
/// sometimes send as strings are kept as strings here on purpose.

// ---------------------------------------------------------------------------
// Open-Meteo
// ---------------------------------------------------------------------------

/// Forecast for central Jakarta (UTC+7). The hourly block starts one slot
/// before the test clock (14:30 local) and the daily block one day before.
pub(crate) fn fixture_open_meteo_forecast_json() -> &'static str {
    r#"{
      "latitude": -6.25,
      "longitude": 106.875,
      "generationtime_ms": 0.08,
      "utc_offset_seconds": 25200,
      "timezone": "Asia/Jakarta",
      "timezone_abbreviation": "WIB",
      "elevation": 8.0,
      "current_units": { "temperature_2m": "°C", "pressure_msl": "hPa" },
      "current": {
        "time": "2025-03-10T14:30",
        "interval": 900,
        "temperature_2m": 30.2,
        "relative_humidity_2m": 70,
        "apparent_temperature": 34.1,
        "is_day": 1,
        "precipitation": 0.0,
        "weather_code": 2,
        "pressure_msl": 1009.4,
        "surface_pressure": 1007.9,
        "wind_speed_10m": 9.7,
        "wind_direction_10m": 250
      },
      "hourly": {
        "time": ["2025-03-10T13:00", "2025-03-10T14:00", "2025-03-10T15:00", "2025-03-10T16:00"],
        "temperature_2m": [30.6, 30.0, 29.1, 28.4],
        "relative_humidity_2m": [68, 70, 76, 81],
        "precipitation_probability": [10, 15, 60, 45],
        "weather_code": [2, 3, 63, 61]
      },
      "daily": {
        "time": ["2025-03-09", "2025-03-10", "2025-03-11"],
        "weather_code": [61, 2, 80],
        "temperature_2m_max": [31.8, 32.4, 31.1],
        "temperature_2m_min": [24.9, 25.3, 24.7],
        "precipitation_sum": [6.2, 0.4, 11.8],
        "precipitation_probability_max": [70, 35, 85],
        "uv_index_max": [7.9, 8.3, 6.1],
        "sunrise": ["2025-03-09T06:01", "2025-03-10T06:01", "2025-03-11T06:01"],
        "sunset": ["2025-03-09T18:10", "2025-03-10T18:09", "2025-03-11T18:09"]
      }
    }"#
}

/// Air quality for the same coordinate. `uv_index` is reported here, not
/// in the forecast's `current` block.
pub(crate) fn fixture_open_meteo_air_quality_json() -> &'static str {
    r#"{
      "latitude": -6.2,
      "longitude": 106.8,
      "utc_offset_seconds": 25200,
      "timezone": "Asia/Jakarta",
      "elevation": 8.0,
      "current": {
        "time": "2025-03-10T14:00",
        "interval": 3600,
        "european_aqi": 42,
        "pm10": 20.4,
        "pm2_5": 12.1,
        "uv_index": 5.3
      }
    }"#
}

// ---------------------------------------------------------------------------
// BMKG
// ---------------------------------------------------------------------------

/// Two days for Gunung Sahari Selatan, out of order within the first day.
/// Slot times are UTC; `local_datetime` is UTC+7.
pub(crate) fn fixture_bmkg_forecast_json() -> &'static str {
    r#"{
      "lokasi": {
        "adm1": "31",
        "adm2": "31.71",
        "adm3": "31.71.03",
        "adm4": "31.71.03.1001",
        "provinsi": "DKI Jakarta",
        "kotkab": "Kota Adm. Jakarta Pusat",
        "kecamatan": "Kemayoran",
        "desa": "Gunung Sahari Selatan",
        "lon": 106.8426,
        "lat": -6.1647,
        "timezone": "Asia/Jakarta"
      },
      "data": [
        {
          "lokasi": { "adm4": "31.71.03.1001", "desa": "Gunung Sahari Selatan" },
          "cuaca": [
            [
              {
                "datetime": "2024-11-26T03:00:00Z",
                "t": 31, "tcc": 88, "tp": 0.0, "weather": 3,
                "weather_desc": "Berawan", "weather_desc_en": "Mostly Cloudy",
                "wd_deg": 340, "wd": "NW", "wd_to": "SE", "ws": "9.1", "hu": 66,
                "vs": 9950, "vs_text": "> 10 km",
                "image": "https://api-apps.bmkg.go.id/storage/icon/cuaca/berawan-am.svg",
                "utc_datetime": "2024-11-26 03:00:00",
                "local_datetime": "2024-11-26 10:00:00"
              },
              {
                "datetime": "2024-11-26T00:00:00Z",
                "t": 27, "tcc": 96, "tp": 0.1, "weather": 3,
                "weather_desc": "Berawan", "weather_desc_en": "Mostly Cloudy",
                "wd_deg": 225, "wd": "SW", "wd_to": "NE", "ws": 6.4, "hu": 83,
                "vs": 8467, "vs_text": "< 9 km",
                "image": "https://api-apps.bmkg.go.id/storage/icon/cuaca/berawan-am.svg",
                "utc_datetime": "2024-11-26 00:00:00",
                "local_datetime": "2024-11-26 07:00:00"
              },
              {
                "datetime": "2024-11-26T06:00:00Z",
                "t": 30, "tcc": 100, "tp": 2.3, "weather": 61,
                "weather_desc": "Hujan Ringan", "weather_desc_en": "Light Rain",
                "wd_deg": 315, "wd": "NW", "wd_to": "SE", "ws": 11.2, "hu": 74,
                "vs": 7200, "vs_text": "< 8 km",
                "image": "https://api-apps.bmkg.go.id/storage/icon/cuaca/hujan%20ringan-pm.svg",
                "utc_datetime": "2024-11-26 06:00:00",
                "local_datetime": "2024-11-26 13:00:00"
              }
            ],
            [
              {
                "datetime": "2024-11-27T00:00:00Z",
                "t": 26, "tcc": 45, "tp": 0.0, "weather": 1,
                "weather_desc": "Cerah Berawan", "weather_desc_en": "Partly Cloudy",
                "wd_deg": 180, "wd": "S", "wd_to": "N", "ws": 4.0, "hu": 88,
                "vs": 10000, "vs_text": "> 10 km",
                "image": "https://api-apps.bmkg.go.id/storage/icon/cuaca/cerah%20berawan-am.svg",
                "utc_datetime": "2024-11-27 00:00:00",
                "local_datetime": "2024-11-27 07:00:00"
              }
            ]
          ]
        }
      ]
    }"#
}

// ---------------------------------------------------------------------------
// Nominatim
// ---------------------------------------------------------------------------

/// Reverse lookup inside a city boundary.
pub(crate) fn fixture_nominatim_city_json() -> &'static str {
    r#"{
      "place_id": 123456,
      "licence": "Data © OpenStreetMap contributors, ODbL 1.0.",
      "osm_type": "relation",
      "lat": "-6.2087634",
      "lon": "106.845599",
      "display_name": "Menteng, Central Jakarta, Special capital Region of Jakarta, Java, 10310, Indonesia",
      "address": {
        "suburb": "Menteng",
        "city": "Central Jakarta",
        "state": "Special capital Region of Jakarta",
        "postcode": "10310",
        "country": "Indonesia",
        "country_code": "id"
      }
    }"#
}

/// Reverse lookup over open water: no address block, only a display name.
pub(crate) fn fixture_nominatim_display_only_json() -> &'static str {
    r#"{
      "place_id": 98765,
      "lat": "-5.9",
      "lon": "106.7",
      "display_name": "Java Sea"
    }"#
}
