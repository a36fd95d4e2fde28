//! Link-quality parsing and the edge styling tiers.

/// Visual tier of a link, derived from its link-quality value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualityTier {
	Strong,
	Medium,
	Weak,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub tier: QualityTier,
	pub color: &'static str,
	pub width: f64,
	/// Preferred edge length; shorter for stronger links.
	pub length: f64,
	/// Whether the simulation may move the edge's endpoints to satisfy `length`.
	pub physics: bool,
}

pub const STRONG_COLOR: &str = "#17ab00";
pub const MEDIUM_COLOR: &str = "#e6b402";
pub const WEAK_COLOR: &str = "#bfbfbf";

/// Map a link-quality value onto its edge style.
///
/// NaN compares false everywhere and therefore lands in the weak tier.
pub fn classify(lqi: f64) -> EdgeStyle {
	let length = 2000.0 - 4.0 * lqi;
	if lqi > 192.0 {
		EdgeStyle {
			tier: QualityTier::Strong,
			color: STRONG_COLOR,
			width: lqi / 20.0,
			length,
			physics: false,
		}
	} else if lqi > 128.0 {
		EdgeStyle {
			tier: QualityTier::Medium,
			color: MEDIUM_COLOR,
			width: 9.0,
			length,
			physics: false,
		}
	} else {
		EdgeStyle {
			tier: QualityTier::Weak,
			color: WEAK_COLOR,
			width: 1.0,
			length,
			physics: false,
		}
	}
}

/// The weaker of two readings. Unlike `f64::min`, a NaN on either side wins.
pub fn weaker(a: f64, b: f64) -> f64 {
	if a.is_nan() || b.is_nan() {
		f64::NAN
	} else {
		a.min(b)
	}
}

/// Parse a reported link quality the way the backend's web clients do: optional leading
/// whitespace and sign, then the leading run of decimal digits. No digits yields NaN.
pub fn parse_lqi(raw: &str) -> f64 {
	let text = raw.trim_start();
	let (sign, digits) = match text.strip_prefix('-') {
		Some(rest) => (-1.0, rest),
		None => (1.0, text.strip_prefix('+').unwrap_or(text)),
	};
	let end = digits
		.find(|c: char| !c.is_ascii_digit())
		.unwrap_or(digits.len());
	match digits[..end].parse::<f64>() {
		Ok(value) if end > 0 => sign * value,
		_ => f64::NAN,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tier_boundaries() {
		let tiers: Vec<_> = [0.0, 128.0, 129.0, 192.0, 193.0, 255.0]
			.into_iter()
			.map(|q| classify(q).tier)
			.collect();
		assert_eq!(
			tiers,
			[
				QualityTier::Weak,
				QualityTier::Weak,
				QualityTier::Medium,
				QualityTier::Medium,
				QualityTier::Strong,
				QualityTier::Strong,
			]
		);
	}

	#[test]
	fn widths_and_lengths() {
		let strong = classify(240.0);
		assert_eq!(strong.width, 12.0);
		assert_eq!(strong.length, 1040.0);
		assert_eq!(strong.color, STRONG_COLOR);

		let medium = classify(150.0);
		assert_eq!(medium.width, 9.0);
		assert_eq!(medium.length, 1400.0);

		let weak = classify(50.0);
		assert_eq!(weak.width, 1.0);
		assert_eq!(weak.color, WEAK_COLOR);

		for q in [0.0, 150.0, 255.0, f64::NAN] {
			assert!(!classify(q).physics);
		}
	}

	#[test]
	fn nan_is_weakest() {
		let style = classify(parse_lqi("n/a"));
		assert_eq!(style.tier, QualityTier::Weak);
		assert_eq!(style.width, 1.0);
		assert!(style.length.is_nan());
		assert!(weaker(f64::NAN, 200.0).is_nan());
		assert!(weaker(200.0, f64::NAN).is_nan());
		assert_eq!(weaker(200.0, 150.0), 150.0);
	}

	#[test]
	fn parses_leading_digits() {
		assert_eq!(parse_lqi("200"), 200.0);
		assert_eq!(parse_lqi("  42 "), 42.0);
		assert_eq!(parse_lqi("200 & 150"), 200.0);
		assert_eq!(parse_lqi("-3"), -3.0);
		assert!(parse_lqi("").is_nan());
		assert!(parse_lqi("-").is_nan());
		assert!(parse_lqi("x12").is_nan());
	}
}
