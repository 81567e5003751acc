use crate::error::{Error, Result};

/// Percent change from the first to the last close. Named for its usual
/// 365-day window; any length works and a single close yields 0.
pub fn annual_return(closes: &[f64]) -> Result<f64> {
    let (start, end) = match (closes.first(), closes.last()) {
        (Some(start), Some(end)) => (*start, *end),
        _ => return Err(Error::EmptySeries),
    };
    if start == 0.0 {
        return Err(Error::ZeroBasePrice);
    }
    Ok(((end - start) / start) * 100.0)
}

/// Arithmetic mean; an empty list is an error rather than NaN.
pub fn average(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::EmptySeries);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}
