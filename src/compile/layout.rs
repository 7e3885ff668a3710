//! Layout compiler.
//!
//! Resolves a node's layout directive and places already-evaluated children.

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::grammar::{Layout, LayoutKind};

/// A layout with every parameter settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResolvedLayout {
    /// Shared frame.
    Layer,
    /// Left-to-right.
    Horizontal,
    /// Top-to-bottom.
    Vertical,
    /// Row-major grid.
    Wrap {
        /// Column count, at least 1.
        columns: usize,
    },
}

/// Settle a node's layout.
///
/// Without a directive, facet nodes default to horizontal and everything
/// else to layer. `wrap` takes its columns from the directive, then from
/// `config`; with neither it is rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidLayout`] for non-positive or fractional columns,
/// `columns` on a non-wrap layout, or a wrap layout with no column count.
pub fn resolve_layout(spec: Option<&Layout>, faceted: bool, config: &LayoutConfig) -> Result<ResolvedLayout> {
    let Some(spec) = spec else {
        return Ok(if faceted {
            ResolvedLayout::Horizontal
        } else {
            ResolvedLayout::Layer
        });
    };

    let columns = spec.columns.map(positive_columns).transpose()?;
    if columns.is_some() && spec.kind != LayoutKind::Wrap {
        let context = if faceted { " over a faceted view" } else { "" };
        return Err(Error::invalid_layout(format!(
            "'{}' layout{context} cannot take columns",
            spec.kind
        )));
    }

    match spec.kind {
        LayoutKind::Layer => Ok(ResolvedLayout::Layer),
        LayoutKind::Horizontal => Ok(ResolvedLayout::Horizontal),
        LayoutKind::Vertical => Ok(ResolvedLayout::Vertical),
        LayoutKind::Wrap => {
            let columns = columns
                .or(config.wrap_columns.filter(|&c| c > 0))
                .ok_or_else(|| Error::invalid_layout("wrap layout requires columns"))?;
            Ok(ResolvedLayout::Wrap { columns })
        }
    }
}

fn positive_columns(columns: f64) -> Result<usize> {
    if columns.is_finite() && columns >= 1.0 && columns.fract() == 0.0 && columns <= u32::MAX as f64 {
        Ok(columns as usize)
    } else {
        Err(Error::invalid_layout(format!(
            "wrap columns must be a positive integer, got {columns}"
        )))
    }
}

/// Where a child sits within its parent's arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Position in the child list.
    pub index: usize,
    /// Grid row (0 = top).
    pub row: usize,
    /// Grid column (0 = left).
    pub column: usize,
    /// Drawing order within a shared frame; later is on top.
    pub layer: usize,
}

/// Normalized rectangle within the parent, in `[0, 1]` units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cell {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// The grid a layout produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Arrangement {
    /// The layout used.
    pub layout: ResolvedLayout,
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub columns: usize,
}

impl Arrangement {
    /// Rectangle occupied by a placement.
    #[must_use]
    pub fn cell(&self, placement: &Placement) -> Cell {
        let rows = self.rows.max(1) as f64;
        let columns = self.columns.max(1) as f64;
        Cell {
            x: placement.column as f64 / columns,
            y: placement.row as f64 / rows,
            width: 1.0 / columns,
            height: 1.0 / rows,
        }
    }
}

/// Place `count` children under `layout`.
#[must_use]
pub fn plan(layout: ResolvedLayout, count: usize) -> (Arrangement, Vec<Placement>) {
    let placements: Vec<Placement> = (0..count)
        .map(|index| {
            let (row, column, layer) = match layout {
                ResolvedLayout::Layer => (0, 0, index),
                ResolvedLayout::Horizontal => (0, index, 0),
                ResolvedLayout::Vertical => (index, 0, 0),
                ResolvedLayout::Wrap { columns } => (index / columns, index % columns, 0),
            };
            Placement {
                index,
                row,
                column,
                layer,
            }
        })
        .collect();

    let (rows, columns) = match layout {
        ResolvedLayout::Layer => (1, 1),
        ResolvedLayout::Horizontal => (1, count.max(1)),
        ResolvedLayout::Vertical => (count.max(1), 1),
        ResolvedLayout::Wrap { columns } => (count.div_ceil(columns).max(1), columns.min(count.max(1))),
    };
    (Arrangement { layout, rows, columns }, placements)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::ErrorKind;

    fn no_default() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn test_default_layouts() {
        assert_eq!(resolve_layout(None, false, &no_default()).unwrap(), ResolvedLayout::Layer);
        assert_eq!(resolve_layout(None, true, &no_default()).unwrap(), ResolvedLayout::Horizontal);
    }

    #[test]
    fn test_wrap_columns() {
        let layout = resolve_layout(Some(&Layout::wrap(3)), true, &no_default()).unwrap();
        assert_eq!(layout, ResolvedLayout::Wrap { columns: 3 });
    }

    #[test]
    fn test_wrap_requires_columns() {
        let err = resolve_layout(Some(&Layout::wrap_default()), true, &no_default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLayout);

        let config = LayoutConfig { wrap_columns: Some(4) };
        let layout = resolve_layout(Some(&Layout::wrap_default()), true, &config).unwrap();
        assert_eq!(layout, ResolvedLayout::Wrap { columns: 4 });
    }

    #[test]
    fn test_wrap_rejects_bad_columns() {
        for bad in [0.0, -2.0, 2.5, f64::NAN] {
            let spec = Layout {
                kind: LayoutKind::Wrap,
                columns: Some(bad),
            };
            let err = resolve_layout(Some(&spec), false, &no_default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidLayout, "columns {bad}");
        }
    }

    #[test]
    fn test_layer_with_columns_over_facet_is_invalid() {
        let spec = Layout {
            kind: LayoutKind::Layer,
            columns: Some(2.0),
        };
        let err = resolve_layout(Some(&spec), true, &no_default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLayout);
        assert!(err.to_string().contains("faceted"));
    }

    #[test]
    fn test_wrap_placement() {
        let (arrangement, placements) = plan(ResolvedLayout::Wrap { columns: 3 }, 7);
        assert_eq!(placements[5].row, 1);
        assert_eq!(placements[5].column, 2);
        assert_eq!(arrangement.rows, 3);
        assert_eq!(arrangement.columns, 3);
    }

    #[test]
    fn test_horizontal_and_vertical_order() {
        let (_, h) = plan(ResolvedLayout::Horizontal, 3);
        assert_eq!(h.iter().map(|p| p.column).collect::<Vec<_>>(), vec![0, 1, 2]);
        let (_, v) = plan(ResolvedLayout::Vertical, 3);
        assert_eq!(v.iter().map(|p| p.row).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_layer_shares_frame() {
        let (arrangement, placements) = plan(ResolvedLayout::Layer, 2);
        assert_eq!((arrangement.rows, arrangement.columns), (1, 1));
        assert_eq!(placements[1].layer, 1);
        let cell = arrangement.cell(&placements[1]);
        assert_relative_eq!(cell.width, 1.0);
        assert_relative_eq!(cell.x, 0.0);
    }

    #[test]
    fn test_cells() {
        let (arrangement, placements) = plan(ResolvedLayout::Wrap { columns: 2 }, 3);
        let cell = arrangement.cell(&placements[2]);
        assert_relative_eq!(cell.x, 0.0);
        assert_relative_eq!(cell.y, 0.5);
        assert_relative_eq!(cell.width, 0.5);
        assert_relative_eq!(cell.height, 0.5);
    }

    #[test]
    fn test_wrap_with_fewer_children_than_columns() {
        let (arrangement, _) = plan(ResolvedLayout::Wrap { columns: 5 }, 2);
        assert_eq!((arrangement.rows, arrangement.columns), (1, 2));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_wrap_is_row_major(columns in 1usize..12, count in 0usize..100) {
            let (arrangement, placements) = plan(ResolvedLayout::Wrap { columns }, count);
            for (i, p) in placements.iter().enumerate() {
                prop_assert_eq!(p.row, i / columns);
                prop_assert_eq!(p.column, i % columns);
                prop_assert!(p.row < arrangement.rows);
                prop_assert!(p.column < arrangement.columns);
            }
        }

        #[test]
        fn prop_cells_stay_in_unit_square(count in 1usize..50, columns in 1usize..8) {
            for layout in [
                ResolvedLayout::Layer,
                ResolvedLayout::Horizontal,
                ResolvedLayout::Vertical,
                ResolvedLayout::Wrap { columns },
            ] {
                let (arrangement, placements) = plan(layout, count);
                for p in &placements {
                    let cell = arrangement.cell(p);
                    prop_assert!(cell.x >= 0.0 && cell.x + cell.width <= 1.0 + 1e-9);
                    prop_assert!(cell.y >= 0.0 && cell.y + cell.height <= 1.0 + 1e-9);
                }
            }
        }
    }
}
