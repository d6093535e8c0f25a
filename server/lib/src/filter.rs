//! Admission filter evaluation.
//!
//! A guild holds a list of filters. A user is admitted when the list is empty,
//! or when at least one filter matches their profile. A filter matches when
//! the profile holds every programme and every course it names.

use usos_auth_proto::v1::Programme;

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The guild has no filters, every verified user is let through.
    Unrestricted,
    /// Admitted by the filter with this (1 based) id.
    Matched(usize),
    Rejected,
}

impl FilterOutcome {
    pub fn is_admitted(self) -> bool {
        !matches!(self, FilterOutcome::Rejected)
    }
}

/// Programmes are named by administrators, so accept the usos id or the
/// name in either language, ignoring case.
fn programme_matches(programme: &Programme, wanted: &str) -> bool {
    let wanted = wanted.trim().to_lowercase();
    programme.id.to_lowercase() == wanted
        || programme
            .description
            .iter()
            .any(|name| name.trim().to_lowercase() == wanted)
}

pub fn filter_matches(filter: &AdmissionFilter, profile: &Profile) -> bool {
    let programmes_ok = filter
        .programmes
        .iter()
        .all(|wanted| profile.programmes().any(|p| programme_matches(p, wanted)));

    let courses_ok = filter
        .courses
        .iter()
        .all(|wanted| profile.course_ids().any(|c| c == wanted.as_str()));

    programmes_ok && courses_ok
}

#[instrument(level = "debug", skip_all, fields(usos_id = %profile.user.id))]
pub fn evaluate(filters: &[AdmissionFilter], profile: &Profile) -> FilterOutcome {
    if filters.is_empty() {
        return FilterOutcome::Unrestricted;
    }

    match filters.iter().position(|f| filter_matches(f, profile)) {
        Some(idx) => {
            debug!(filter = idx + 1, "profile matched filter");
            FilterOutcome::Matched(idx + 1)
        }
        None => {
            debug!(filters = filters.len(), "profile matched no filter");
            FilterOutcome::Rejected
        }
    }
}
