//! Per-worker series extraction and chart data binding.
//!
//! Every series has one point per entry. Rows from other workers, or rows
//! missing the field, hold `f64::NAN` so that index `i` lines up across all
//! series drawn on the shared x-axis.

use crate::model::{LogEntry, SampleField, Worker, WorkerRef};

/// Workers charted by default (the communicator is too noisy to plot).
pub const DEFAULT_CHART_WORKERS: [Worker; 3] = [Worker::Main, Worker::Strategy, Worker::Api];

/// Align `field` of `filter`'s entries against the whole collection.
pub fn extract(entries: &[LogEntry], filter: &WorkerRef, field: SampleField) -> Vec<f64> {
    match filter.resolve() {
        Some(worker) => extract_worker(entries, worker, field),
        None => vec![f64::NAN; entries.len()],
    }
}

pub fn extract_worker(entries: &[LogEntry], worker: Worker, field: SampleField) -> Vec<f64> {
    entries
        .iter()
        .map(|e| {
            if e.worker() == Some(worker) {
                e.sample(field).unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub worker: Worker,
    pub field: SampleField,
    pub points: Vec<f64>,
}

impl Series {
    pub fn has_points(&self) -> bool {
        self.points.iter().any(|p| !p.is_nan())
    }
}

pub fn chart_series(entries: &[LogEntry], workers: &[Worker], field: SampleField) -> Vec<Series> {
    workers
        .iter()
        .map(|&worker| Series {
            label: format!("{} {}", worker.tag(), field.display_name()),
            worker,
            field,
            points: extract(entries, &WorkerRef::from(worker), field),
        })
        .collect()
}

/// Min/max over all real points; `None` when every point is a sentinel.
pub fn value_range(series: &[Series]) -> Option<(f64, f64)> {
    series
        .iter()
        .flat_map(|s| s.points.iter().copied())
        .filter(|p| p.is_finite())
        .fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
        })
}

/// Box coordinates of every point, `None` at sentinels (and any non-finite value).
fn project(points: &[f64], range: (f64, f64), width: f64, height: f64) -> impl Iterator<Item = Option<(f64, f64)>> + '_ {
    let (lo, hi) = range;
    let span = if hi > lo { hi - lo } else { 1.0 };
    let step = if points.len() > 1 { width / (points.len() - 1) as f64 } else { 0.0 };
    points.iter().enumerate().map(move |(i, &p)| {
        p.is_finite()
            .then(|| (i as f64 * step, height - ((p - lo) / span) * height))
    })
}

/// Project points into a `width` x `height` box, breaking the line at sentinels.
/// Each returned segment is a run of consecutive real points; runs of one point
/// are kept and only show up through [`point_markers`].
pub fn polyline_segments(points: &[f64], range: (f64, f64), width: f64, height: f64) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for xy in project(points, range, width, height) {
        match xy {
            Some(xy) => current.push(xy),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// One marker per real point, so isolated samples between sentinels stay visible.
pub fn point_markers(points: &[f64], range: (f64, f64), width: f64, height: f64) -> Vec<(f64, f64)> {
    project(points, range, width, height).flatten().collect()
}

/// SVG `points` attribute for one segment.
pub fn svg_points(segment: &[(f64, f64)]) -> String {
    segment
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(worker: i64, mhu: Option<f64>) -> LogEntry {
        LogEntry {
            worker_raw: Some(WorkerRef::Code(worker)),
            heap_used: mhu,
            ..Default::default()
        }
    }

    fn same(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y)
    }

    #[test]
    fn main_worker_heap_used() {
        let entries = vec![entry(0, Some(10.0)), entry(1, Some(20.0)), entry(0, Some(30.0))];
        let got = extract(&entries, &WorkerRef::Code(0), SampleField::HeapUsed);
        assert!(same(&got, &[10.0, f64::NAN, 30.0]));
    }

    #[test]
    fn output_is_aligned_with_input() {
        let entries = vec![entry(0, None), entry(2, Some(1.0)), entry(7, Some(2.0)), entry(3, Some(4.0))];
        for code in [0, 1, 2, 3, 42] {
            let got = extract(&entries, &WorkerRef::Code(code), SampleField::HeapUsed);
            assert_eq!(got.len(), entries.len());
        }
    }

    #[test]
    fn unknown_filter_gives_only_sentinels() {
        let entries = vec![entry(0, Some(1.0)), entry(1, Some(2.0))];
        let got = extract(&entries, &WorkerRef::Tag("scheduler".into()), SampleField::HeapUsed);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|p| p.is_nan()));
    }

    #[test]
    fn missing_field_is_sentinel_and_values_are_exact() {
        let v = 123_456_789.123_456_78_f64;
        let entries = vec![entry(3, None), entry(3, Some(v))];
        let got = extract(&entries, &WorkerRef::Tag("api".into()), SampleField::HeapUsed);
        assert!(got[0].is_nan());
        assert_eq!(got[1].to_bits(), v.to_bits());
    }

    #[test]
    fn extraction_is_repeatable() {
        let entries = vec![entry(1, Some(5.0)), entry(0, Some(6.0))];
        let a = extract(&entries, &WorkerRef::Code(1), SampleField::HeapUsed);
        let b = extract(&entries, &WorkerRef::Code(1), SampleField::HeapUsed);
        assert!(same(&a, &b));
    }

    #[test]
    fn empty_collection_gives_empty_series() {
        let series = chart_series(&[], &DEFAULT_CHART_WORKERS, SampleField::HeapUsed);
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|s| s.points.is_empty() && !s.has_points()));
        assert_eq!(value_range(&series), None);
    }

    #[test]
    fn range_ignores_sentinels() {
        let entries = vec![entry(0, Some(4.0)), entry(1, Some(-2.0)), entry(0, None)];
        let series = chart_series(&entries, &[Worker::Main, Worker::Strategy], SampleField::HeapUsed);
        assert_eq!(series[0].label, "main heap used");
        assert_eq!(value_range(&series), Some((-2.0, 4.0)));
    }

    #[test]
    fn segments_break_at_sentinels() {
        let points = [1.0, 2.0, f64::NAN, 3.0, f64::NAN, f64::NAN];
        let segs = polyline_segments(&points, (1.0, 3.0), 50.0, 10.0);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0], vec![(0.0, 10.0), (10.0, 5.0)]);
        assert_eq!(segs[1], vec![(30.0, 0.0)]);
        assert_eq!(svg_points(&segs[0]), "0.00,10.00 10.00,5.00");
    }

    #[test]
    fn interleaved_workers_still_get_a_marker_per_sample() {
        let entries = vec![entry(0, Some(10.0)), entry(1, Some(20.0)), entry(0, Some(30.0))];
        let series = chart_series(&entries, &[Worker::Main, Worker::Strategy], SampleField::HeapUsed);
        let range = value_range(&series).unwrap();
        let main = &series[0];
        // Sentinel between the two samples: no line, but both points are drawn.
        assert!(polyline_segments(&main.points, range, 1000.0, 150.0).iter().all(|s| s.len() == 1));
        assert_eq!(point_markers(&main.points, range, 1000.0, 150.0), vec![(0.0, 150.0), (1000.0, 0.0)]);
        for s in &series {
            let real = s.points.iter().filter(|p| !p.is_nan()).count();
            assert_eq!(point_markers(&s.points, range, 1000.0, 150.0).len(), real);
        }
    }

    #[test]
    fn non_finite_points_are_gaps() {
        let points = [f64::INFINITY, 5.0, f64::NEG_INFINITY];
        let series = vec![Series {
            label: "main heap used".into(),
            worker: Worker::Main,
            field: SampleField::HeapUsed,
            points: points.to_vec(),
        }];
        let range = value_range(&series).unwrap();
        assert_eq!(range, (5.0, 5.0));
        let markers = point_markers(&points, range, 100.0, 10.0);
        assert_eq!(markers, vec![(50.0, 10.0)]);
        assert!(markers.iter().all(|(x, y)| x.is_finite() && y.is_finite()));
    }
}
