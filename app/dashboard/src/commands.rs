//! FILENAME: app/dashboard/src/commands.rs
// PURPOSE: Dashboard commands: session lifecycle, filter changes and reports.
// CONTEXT: Each command locks the session map only long enough to read or
//          update one cascade; aggregation runs on a cloned cascade after
//          the lock is released.

use cascade_engine::{top_n_breakdown, FilterCascade};
use chrono::Utc;

use crate::api_types::{AppliedFilter, DashboardReport, FilterPanel, FilterWidget, RowsView};
use crate::error::AppError;
use crate::state::{AppState, SessionId};
use crate::{log_debug, log_info};

// ============================================================================
// SESSION LIFECYCLE
// ============================================================================

pub fn open_session(state: &AppState) -> Result<SessionId, AppError> {
    let session = state.new_session()?;
    let id = SessionId::new_v4();
    state.sessions().insert(id, session);
    log_info!("SESSION", "open_session id={} active={}", id, state.session_count());
    Ok(id)
}

pub fn close_session(state: &AppState, id: SessionId) -> Result<(), AppError> {
    match state.sessions().remove(&id) {
        Some(_) => {
            log_info!("SESSION", "close_session id={}", id);
            Ok(())
        }
        None => Err(AppError::UnknownSession(id)),
    }
}

/// Snapshot of one session's cascade.
fn cascade_of(state: &AppState, id: SessionId) -> Result<FilterCascade, AppError> {
    state
        .sessions()
        .get(&id)
        .map(|s| s.cascade.clone())
        .ok_or(AppError::UnknownSession(id))
}

/// Runs `f` on one session's cascade under the lock and returns the
/// cascade as it stands afterwards.
fn update_cascade<T>(
    state: &AppState,
    id: SessionId,
    f: impl FnOnce(&mut FilterCascade) -> Result<T, AppError>,
) -> Result<(T, FilterCascade), AppError> {
    let mut sessions = state.sessions();
    let session = sessions.get_mut(&id).ok_or(AppError::UnknownSession(id))?;
    let out = f(&mut session.cascade)?;
    Ok((out, session.cascade.clone()))
}

// ============================================================================
// FILTERS
// ============================================================================

pub fn get_filter_panel(state: &AppState, id: SessionId) -> Result<FilterPanel, AppError> {
    let cascade = cascade_of(state, id)?;
    build_panel(&cascade, Vec::new())
}

/// Sets one facet, addressed by label or column name. `"All"` clears it.
/// A value outside the facet's options is rejected and nothing changes.
pub fn select(state: &AppState, id: SessionId, facet: &str, label: &str) -> Result<FilterPanel, AppError> {
    let prune = state.config.prune_stale_selections;
    let (pruned, cascade) = update_cascade(state, id, |cascade| {
        cascade.set_selection_by_label(facet, label)?;
        Ok(if prune { cascade.prune_stale() } else { Vec::new() })
    })?;

    log_debug!("FILTER", "select id={} facet={} value={} pruned={:?}", id, facet, label, pruned);
    let pruned = pruned
        .into_iter()
        .map(|index| cascade.facet(index).map(|f| f.label.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    build_panel(&cascade, pruned)
}

pub fn reset_filters(state: &AppState, id: SessionId) -> Result<FilterPanel, AppError> {
    let ((), cascade) = update_cascade(state, id, |cascade| {
        cascade.reset();
        Ok(())
    })?;
    log_debug!("FILTER", "reset_filters id={}", id);
    build_panel(&cascade, Vec::new())
}

fn build_panel(cascade: &FilterCascade, pruned: Vec<String>) -> Result<FilterPanel, AppError> {
    let stale = cascade.stale_facets();
    let mut widgets = Vec::with_capacity(cascade.facet_count());
    for (index, facet) in cascade.facets().enumerate() {
        widgets.push(FilterWidget {
            label: facet.label.clone(),
            column: facet.column.clone(),
            options: cascade.options_for(index)?,
            selected: cascade.selection(index)?.label().to_string(),
            stale: stale.contains(&index),
        });
    }
    Ok(FilterPanel {
        widgets,
        row_count: cascade.current_subset().len(),
        pruned,
    })
}

fn applied_filters(cascade: &FilterCascade) -> Vec<AppliedFilter> {
    cascade
        .facets()
        .zip(cascade.selections())
        .map(|(facet, selection)| AppliedFilter {
            facet: facet.label.clone(),
            value: selection.label().to_string(),
        })
        .collect()
}

// ============================================================================
// REPORT
// ============================================================================

pub fn render_report(state: &AppState, id: SessionId) -> Result<DashboardReport, AppError> {
    let cascade = cascade_of(state, id)?;
    let subset = cascade.current_subset();
    let columns = &state.config.columns;

    let aggregates = state.catalog.evaluate_all(&subset)?;
    let top_districts = top_n_breakdown(
        &subset,
        &columns.district,
        &columns.area_type,
        &columns.total_measure,
        state.config.top_n,
    )?;

    log_info!(
        "REPORT",
        "render_report id={} rows={} aggregates={}",
        id,
        subset.len(),
        aggregates.len()
    );

    Ok(DashboardReport {
        generated_at: Utc::now().to_rfc3339(),
        filters: applied_filters(&cascade),
        row_count: subset.len(),
        aggregates,
        top_districts,
    })
}

/// Header plus up to `limit` rows of the current subset.
pub fn filtered_rows(state: &AppState, id: SessionId, limit: Option<usize>) -> Result<RowsView, AppError> {
    let cascade = cascade_of(state, id)?;
    let subset = cascade.current_subset();

    let headers = state
        .dataset
        .schema()
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let rows = subset
        .rows()
        .take(limit.unwrap_or(usize::MAX))
        .map(|row| row.values().iter().map(ToString::to_string).collect())
        .collect();

    Ok(RowsView {
        headers,
        rows,
        total_rows: subset.len(),
    })
}

/// Applies `(facet, value)` pairs in facet order, so each value is checked
/// against options narrowed by the earlier facets. The batch is applied to
/// a copy and committed only if every pair is accepted.
pub fn apply_selections(state: &AppState, id: SessionId, selections: &[(String, String)]) -> Result<FilterPanel, AppError> {
    let prune = state.config.prune_stale_selections;
    let (pruned, cascade) = update_cascade(state, id, |cascade| {
        let mut staged = cascade.clone();
        let mut ordered = Vec::with_capacity(selections.len());
        for (facet, value) in selections {
            ordered.push((staged.facet_index(facet)?, facet.as_str(), value.as_str()));
        }
        ordered.sort_by_key(|(index, _, _)| *index);

        for (_, facet, value) in ordered {
            staged.set_selection_by_label(facet, value)?;
        }
        let pruned = if prune { staged.prune_stale() } else { Vec::new() };
        *cascade = staged;
        Ok(pruned)
    })?;

    log_debug!("FILTER", "apply_selections id={} count={} pruned={:?}", id, selections.len(), pruned);
    let pruned = pruned
        .into_iter()
        .map(|index| cascade.facet(index).map(|f| f.label.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    build_panel(&cascade, pruned)
}
