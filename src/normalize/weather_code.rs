/// WMO weather interpretation codes (as used by Open-Meteo) mapped to a
/// short description and an icon name the UI resolves to artwork.

/// Returns `(description, icon)` for a weather code.
///
/// `is_day` picks the day or night variant for clear and partly cloudy
/// skies. Unknown codes map to `("Unknown", "unknown")`.
pub fn describe(code: f64, is_day: bool) -> (&'static str, &'static str) {
    if !code.is_finite() || code < 0.0 || code.fract() != 0.0 {
        return ("Unknown", "unknown");
    }

    match code as u32 {
        0 => ("Clear sky", if is_day { "clear-day" } else { "clear-night" }),
        1 => ("Mainly clear", if is_day { "clear-day" } else { "clear-night" }),
        2 => ("Partly cloudy", if is_day { "partly-cloudy-day" } else { "partly-cloudy-night" }),
        3 => ("Overcast", "overcast"),
        45 => ("Fog", "fog"),
        48 => ("Depositing rime fog", "fog"),
        51 => ("Light drizzle", "drizzle"),
        53 => ("Moderate drizzle", "drizzle"),
        55 => ("Dense drizzle", "drizzle"),
        56 => ("Light freezing drizzle", "sleet"),
        57 => ("Dense freezing drizzle", "sleet"),
        61 => ("Slight rain", "rain"),
        63 => ("Moderate rain", "rain"),
        65 => ("Heavy rain", "rain"),
        66 => ("Light freezing rain", "sleet"),
        67 => ("Heavy freezing rain", "sleet"),
        71 => ("Slight snow fall", "snow"),
        73 => ("Moderate snow fall", "snow"),
        75 => ("Heavy snow fall", "snow"),
        77 => ("Snow grains", "snow"),
        80 => ("Slight rain showers", "showers"),
        81 => ("Moderate rain showers", "showers"),
        82 => ("Violent rain showers", "showers"),
        85 => ("Slight snow showers", "snow"),
        86 => ("Heavy snow showers", "snow"),
        95 => ("Thunderstorm", "thunderstorm"),
        96 => ("Thunderstorm with slight hail", "thunderstorm"),
        99 => ("Thunderstorm with heavy hail", "thunderstorm"),
        _ => ("Unknown", "unknown"),
    }
}
