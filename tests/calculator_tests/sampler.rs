use super::*;

mod sampling {
  use super::*;

  #[test]
  fn default_range_and_count() {
    let series = sample_function("x^2", &SamplerOptions::default());
    assert_eq!(series.len(), 101);
    assert_eq!(series.points[0].x, -10.0);
    assert_eq!(series.points[100].x, 10.0);
    assert_eq!(series.points[50].y, 0.0);
    assert!(series.points.iter().all(|p| p.negated_y.is_none()));
  }

  #[test]
  fn values_are_rounded_to_two_decimals() {
    let options = SamplerOptions {
      point_count: 3,
      ..SamplerOptions::range(0.0, 1.0)
    };
    let series = sample_function("x", &options);
    let xs: Vec<f64> = series.points.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0.0, 0.33, 0.67, 1.0]);
  }

  #[test]
  fn skips_undefined_points() {
    let options = SamplerOptions {
      point_count: 20,
      ..SamplerOptions::range(-1.0, 1.0)
    };
    let series = sample_function("1/x", &options);
    assert_eq!(series.len(), 20);
    assert!(series.points.iter().all(|p| p.x != 0.0));
    assert!(series.points.iter().all(|p| p.y.is_finite()));
  }

  #[test]
  fn huge_values_stay_finite() {
    let options = SamplerOptions {
      point_count: 10,
      ..SamplerOptions::range(700.0, 709.0)
    };
    let series = sample_function("exp(x)", &options);
    assert_eq!(series.len(), 11);
    assert!(series.points.iter().all(|p| p.y.is_finite()), "{series:?}");
    assert_close(series.points[10].y / 709f64.exp(), 1.0, 1e-12);
  }

  #[test]
  fn volume_mode_mirrors_values() {
    let options = SamplerOptions {
      mode: PlotMode::Volume,
      point_count: 10,
      ..SamplerOptions::range(0.0, 2.0)
    };
    let series = sample_function("x + 1", &options);
    assert_eq!(series.mode, PlotMode::Volume);
    for point in &series.points {
      assert_eq!(point.negated_y, Some(-point.y));
    }
  }

  #[test]
  fn deterministic() {
    let options = SamplerOptions::range(-3.0, 3.0);
    assert_eq!(
      sample_function("sin(x)*x", &options),
      sample_function("sin(x)*x", &options)
    );
  }
}

mod unplottable {
  use super::*;

  #[test]
  fn bad_inputs_give_empty_series() {
    assert!(sample_function("x +", &SamplerOptions::default()).is_empty());
    assert!(sample_function("x", &SamplerOptions::range(5.0, 1.0)).is_empty());
    assert!(
      sample_function("x", &SamplerOptions::range(0.0, f64::INFINITY)).is_empty()
    );
    let no_points = SamplerOptions {
      point_count: 0,
      ..SamplerOptions::default()
    };
    assert!(sample_function("x", &no_points).is_empty());
  }

  #[test]
  fn nowhere_defined_function() {
    let series = sample_function("sqrt(-1 - x^2)", &SamplerOptions::default());
    assert!(!series.is_plottable());
  }

  #[test]
  fn empty_series_renders_placeholder() {
    let series = sample_function("log(-1 - x^2)", &SamplerOptions::default());
    let view = render_graph(&series, &GraphOptions::default());
    assert_eq!(view, GraphView::Placeholder(PLACEHOLDER_MESSAGE.to_string()));
  }
}

mod rendering {
  use super::*;

  #[test]
  fn plottable_series_renders_svg() {
    let series = sample_function("x^2 - 4", &SamplerOptions::range(-3.0, 3.0));
    match render_graph(&series, &GraphOptions::default()) {
      GraphView::Chart(svg) => {
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
      }
      GraphView::Placeholder(message) => panic!("unexpected placeholder: {message}"),
    }
  }

  #[test]
  fn chart_with_gap_and_mirror() {
    let options = SamplerOptions {
      mode: PlotMode::Volume,
      ..SamplerOptions::range(-2.0, 2.0)
    };
    let series = sample_function("1/x", &options);
    assert!(render_graph(&series, &GraphOptions::default()).is_chart());
  }
}
