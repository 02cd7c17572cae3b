use crate::math::intersect_3d::plane_intersections;
use crate::math::projection::project_point_2d;
use crate::math::{Plane, Point3, Vector3, TOLERANCE};

use super::{HoleValidity, LayerGeomDef};

impl LayerGeomDef {
    /// Splits a cut line into the parts not interrupted by the layer's holes.
    ///
    /// `intersection` is the cut segment where `plane` crosses the layer.
    /// Each valid hole, shifted by `hole_offset`, is intersected with the
    /// plane; holes that cross it exactly twice and start on the segment
    /// contribute a range. Returns the complement of the merged ranges as
    /// fractions of the segment, or `[(0, 1)]` when no hole interrupts it.
    #[must_use]
    pub fn ranges_for_holes_on_plane(
        &self,
        intersection: (Point3, Point3),
        hole_offset: &Vector3,
        plane: &Plane,
        axis_x: &Vector3,
        axis_y: &Vector3,
        origin: &Point3,
    ) -> Vec<(f64, f64)> {
        let start = project_point_2d(&intersection.0, axis_x, axis_y, origin);
        let end = project_point_2d(&intersection.1, axis_x, axis_y, origin);
        let length = (end - start).norm();
        if length < TOLERANCE {
            return vec![(0.0, 1.0)];
        }
        let dir = (end - start) / length;

        let mut hole_ranges: Vec<(f64, f64)> = Vec::new();
        for (hole, _) in self
            .holes()
            .iter()
            .zip(self.hole_validity())
            .filter(|(_, v)| **v == HoleValidity::Valid)
        {
            let crossings = plane_intersections(&hole.points, plane, hole_offset);
            let [hole_start, hole_end] = crossings.as_slice() else {
                continue;
            };
            let hole_start = project_point_2d(hole_start, axis_x, axis_y, origin);
            let hole_end = project_point_2d(hole_end, axis_x, axis_y, origin);

            let along = (hole_start - start).dot(&dir);
            if along < 0.0 || along > length {
                continue;
            }

            let hs = ((hole_start - start).norm() / length).min(1.0);
            let he = ((hole_end - start).norm() / length).min(1.0);
            hole_ranges.push(if hs > he { (he, hs) } else { (hs, he) });
        }

        hole_ranges.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let mut merged: Vec<(f64, f64)> = Vec::new();
        for range in hole_ranges {
            match merged.last_mut() {
                Some(last) if range.0 <= last.1 => last.1 = last.1.max(range.1),
                _ => merged.push(range),
            }
        }

        let mut visible = Vec::with_capacity(merged.len() + 1);
        let mut cursor = 0.0;
        for (hole_start, hole_end) in merged {
            visible.push((cursor, hole_start));
            cursor = hole_end;
        }
        visible.push((cursor, 1.0));
        visible
    }
}
