//! Splits credentials into the segments between consecutive milestones.

use std::collections::HashMap;

use super::types::{Credential, Milestone, Segment};

/// Credential that always opens its segment, whatever its year.
pub const PRIMARY_CREDENTIAL_ID: &str = "primary";

const MONTHS: [&str; 12] = [
	"january",
	"february",
	"march",
	"april",
	"may",
	"june",
	"july",
	"august",
	"september",
	"october",
	"november",
	"december",
];

/// One segment per consecutive milestone pair `[A, B]`.
///
/// Segment 0 takes `A <= year <= B`; every later segment takes
/// `A < year <= B`, so a credential dated on a boundary year belongs to the
/// earlier segment and no credential lands in two segments.
pub fn build_segments(milestones: &[Milestone], credentials: &[Credential]) -> Vec<Segment> {
	milestones
		.windows(2)
		.enumerate()
		.map(|(i, pair)| {
			let (from_year, to_year) = (pair[0].year, pair[1].year);
			let credential_ids = credentials
				.iter()
				.filter(|c| {
					let after_start = if i == 0 {
						c.year >= from_year
					} else {
						c.year > from_year
					};
					after_start && c.year <= to_year
				})
				.map(|c| c.id.clone())
				.collect();
			Segment {
				from_year,
				to_year,
				credential_ids,
			}
		})
		.collect()
}

/// Credentials of `segment` in path order: the primary credential first,
/// then by year, then by numeric id. Unknown ids are skipped.
pub fn ordered_credentials(segment: &Segment, credentials: &[Credential]) -> Vec<Credential> {
	let by_id: HashMap<&str, &Credential> =
		credentials.iter().map(|c| (c.id.as_str(), c)).collect();
	let mut list: Vec<Credential> = segment
		.credential_ids
		.iter()
		.filter_map(|id| by_id.get(id.as_str()).map(|c| (*c).clone()))
		.collect();
	list.sort_by(|a, b| {
		let a_primary = a.id == PRIMARY_CREDENTIAL_ID;
		let b_primary = b.id == PRIMARY_CREDENTIAL_ID;
		b_primary
			.cmp(&a_primary)
			.then(a.year.cmp(&b.year))
			.then(a.numeric_id.cmp(&b.numeric_id))
	});
	list
}

/// Short label under a credential circle: `"Mon YYYY"` when the free-form
/// date names a month, the raw range for a primary `"YYYY-YYYY"` date,
/// otherwise the year.
pub fn circle_label(credential: &Credential) -> String {
	let Some(date) = credential.date.as_deref().map(str::trim) else {
		return credential.year.to_string();
	};
	if credential.id == PRIMARY_CREDENTIAL_ID && is_year_range(date) {
		return date.to_string();
	}
	let lower = date.to_lowercase();
	let month = MONTHS.iter().position(|m| {
		lower.contains(m)
			|| lower
				.split(|c: char| !c.is_alphabetic())
				.any(|word| word.len() >= 3 && m.starts_with(word))
	});
	match month {
		Some(i) => {
			let name = MONTHS[i];
			let mut abbrev: String = name[..1].to_uppercase();
			abbrev.push_str(&name[1..3]);
			format!("{abbrev} {}", credential.year)
		}
		None => credential.year.to_string(),
	}
}

fn is_year_range(s: &str) -> bool {
	let Some((a, b)) = s.split_once('-') else {
		return false;
	};
	let year = |p: &str| {
		let p = p.trim();
		p.len() == 4 && p.chars().all(|c| c.is_ascii_digit())
	};
	year(a) && year(b)
}
