//! Static AQI advisory tables.
//!
//! The provider's AQI scale runs 1 (Good) to 5 (Very Poor). Both lookups are
//! total: anything outside the scale degrades to the literal fallback text.

/// Human label for an AQI category.
#[must_use]
pub fn label_for(aqi: i64) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

/// Health advice for an AQI category.
#[must_use]
pub fn advice_for(aqi: i64) -> &'static str {
    match aqi {
        1 => "Air quality is good. Great for outdoor activities.",
        2 => "Acceptable air quality. Minor precautions for sensitive groups.",
        3 => "Moderate pollution. Consider reducing outdoor exertion.",
        4 => "Unhealthy. Avoid outdoor activities and wear a mask.",
        5 => "Very unhealthy. Stay indoors with air purification if possible.",
        _ => "No advice available.",
    }
}
