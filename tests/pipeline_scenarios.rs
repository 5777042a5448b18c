use std::collections::HashMap;

use empathic_accuracy_lib::models::{
    LiveSample, RatingEvent, RawRatingSeries, ReferenceRow, StimulusName, Trial, TrialKey,
};
use empathic_accuracy_lib::pipeline::{Pipeline, PipelineConfig, PipelineStage};
use empathic_accuracy_lib::series::{pearson, resample};
use empathic_accuracy_lib::AnalysisError;

fn stimulus(name: &str) -> StimulusName {
    StimulusName::from_filename(name).unwrap()
}

fn references(entries: &[(&str, &[(f64, f64)])]) -> HashMap<StimulusName, Vec<ReferenceRow>> {
    entries
        .iter()
        .map(|(name, rows)| {
            (
                stimulus(name),
                rows.iter()
                    .map(|&(rating, time)| ReferenceRow { rating, time })
                    .collect(),
            )
        })
        .collect()
}

fn trial(ppt: &str, index: u32, video: Option<&str>, samples: &[(f64, f64)]) -> Trial {
    Trial {
        key: TrialKey {
            participant: ppt.into(),
            session: "1".into(),
            trial_index: index,
        },
        affect: "sad".into(),
        timestamp: None,
        video_filename: video.map(str::to_string),
        responses: samples
            .iter()
            .map(|&(ms, rating)| LiveSample::Triple(ms, ms, rating))
            .collect(),
    }
}

#[test]
fn constant_live_series_reports_nan_not_error() {
    let refs = references(&[("EA03-N1", &[(1.0, 0.0), (9.0, 2.0)])]);
    let trials = vec![trial(
        "7",
        1,
        Some("videos/EA03-N1.mp4"),
        &[(0.0, 0.5), (2000.0, 0.5)],
    )];

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(trials)
        .unwrap();

    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.stimulus.as_str(), "EA03-N1");
    assert!(record.pearson_vs_reference.is_nan());
    assert!(record.pearson_vs_mean.is_nan());

    let series = report.stimulus_series();
    assert_eq!(series.len(), 1);
    let reference = series[0].reference;
    assert_eq!(reference.len(), 2001);
    assert!(reference[..2000].iter().all(|&v| v == 0.0));
    assert_eq!(reference[2000], 1.0);
    assert!(series[0].trials[0].1.iter().all(|&v| v == 0.5));
}

#[test]
fn raters_holding_a_non_dyadic_value_report_nan() {
    let refs = references(&[("EA03-N1", &[(1.0, 0.0), (5.0, 1.0), (9.0, 2.0)])]);
    let trials = vec![
        trial("1", 1, Some("EA03-N1.mp4"), &[(0.0, 0.7)]),
        trial("2", 1, Some("EA03-N1.mp4"), &[(0.0, 0.1)]),
    ];

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(trials)
        .unwrap();

    assert_eq!(report.records.len(), 2);
    for record in &report.records {
        assert!(record.pearson_vs_reference.is_nan(), "{}", record.participant);
        assert!(record.pearson_vs_mean.is_nan(), "{}", record.participant);
    }
    let series = report.stimulus_series();
    assert_eq!(series[0].mean.len(), 2001);
    assert!(series[0].mean.iter().all(|&v| v == series[0].mean[0]));
}

#[test]
fn corrupt_times_only_affect_their_own_stimulus_or_trial() {
    let refs = references(&[
        ("EA03-N1", &[(1.0, 0.0), (9.0, f64::INFINITY)]),
        ("EA04-N1", &[(1.0, 0.0), (9.0, 1.0)]),
    ]);
    let trials = vec![
        trial("1", 1, Some("EA03-N1.mp4"), &[(200.0, 0.4), (800.0, 0.9)]),
        trial("1", 2, Some("EA04-N1.mp4"), &[(200.0, 0.4), (800.0, 0.9)]),
        trial("1", 3, Some("EA04-N1.mp4"), &[(200.0, 0.4), (1e15, 0.9)]),
        trial("1", 4, Some("EA03-N1.mp4"), &[(300.0, 0.6)]),
    ];

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(trials)
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].trial_index, 2);
    assert_eq!(report.records[0].stimulus.as_str(), "EA04-N1");
    assert!(report.records[0].pearson_vs_reference > 0.0);

    let mut skipped: Vec<u32> = report.skipped.iter().map(|s| s.key.trial_index).collect();
    skipped.sort_unstable();
    assert_eq!(skipped, vec![1, 3, 4]);
    assert!(report
        .skipped
        .iter()
        .filter(|s| s.key.trial_index != 3)
        .all(|s| s.reason.contains("EA03-N1")));
}

#[test]
fn empty_trial_is_skipped_and_others_continue() {
    let refs = references(&[("EA03-N1", &[(1.0, 0.0), (5.0, 1.0), (9.0, 2.0)])]);
    let trials = vec![
        trial("1", 1, Some("EA03-N1.mp4"), &[(400.0, 0.9), (1600.0, 0.1)]),
        trial("1", 2, Some("EA03-N1.mp4"), &[]),
        trial("1", 3, Some("EA03-N1.mp4"), &[(900.0, 0.2), (1800.0, 1.0)]),
    ];

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(trials)
        .unwrap();

    let indices: Vec<u32> = report.records.iter().map(|r| r.trial_index).collect();
    assert_eq!(indices, vec![1, 3]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].key.trial_index, 2);
    assert_eq!(report.skipped[0].reason, AnalysisError::EmptySeries.to_string());
}

#[test]
fn bad_filename_and_missing_reference_only_affect_their_trials() {
    let refs = references(&[("EA01-P1", &[(1.0, 0.0), (9.0, 1.0)])]);
    let trials = vec![
        trial("1", 1, Some("practice.mp4"), &[(100.0, 0.3)]),
        trial("1", 2, None, &[(100.0, 0.3)]),
        trial("1", 3, Some("EA99-N9.mp4"), &[(100.0, 0.3)]),
        trial("1", 4, Some("EA99-N9.mp4"), &[(100.0, 0.3)]),
        trial("1", 5, Some("EA01-P1.mp4"), &[(100.0, 0.3), (600.0, 0.8)]),
    ];

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(trials)
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].trial_index, 5);
    assert!(report.records[0].pearson_vs_reference > 0.0);

    let skipped: Vec<u32> = report.skipped.iter().map(|s| s.key.trial_index).collect();
    assert_eq!(skipped, vec![1, 2, 3, 4]);
    assert!(report.skipped[2].reason.contains("EA99-N9"));
}

#[test]
fn mean_includes_every_trial_of_the_stimulus() {
    let refs = references(&[("EA02-N3", &[(1.0, 0.0), (9.0, 1.0), (5.0, 2.0)])]);
    let trials = vec![
        trial("a", 1, Some("EA02-N3.mp4"), &[(500.0, 1.0), (1500.0, 0.0)]),
        trial("b", 1, Some("EA02-N3.mp4"), &[(1000.0, 0.2)]),
    ];

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(trials)
        .unwrap();

    let series = report.stimulus_series();
    let a = series[0].trials[0].1;
    let b = series[0].trials[1].1;
    let mean = report.mean_for(&stimulus("EA02-N3")).unwrap();
    assert_eq!(mean.len(), 2001);
    for ms in 0..mean.len() {
        assert!((mean[ms] - (a[ms] + b[ms]) / 2.0).abs() < 1e-12);
    }
    assert_eq!(mean[0], 0.5);
    assert_eq!(mean[600], (1.0 + 0.5) / 2.0);
    assert_eq!(mean[1200], (1.0 + 0.2) / 2.0);
    assert_eq!(mean[1700], (0.0 + 0.2) / 2.0);

    for record in &report.records {
        assert!((-1.0..=1.0).contains(&record.pearson_vs_mean));
    }
}

#[test]
fn single_rater_correlates_perfectly_with_their_own_mean() {
    let refs = references(&[("EA04-P2", &[(3.0, 0.0), (7.0, 1.5)])]);
    let trials = vec![trial("z", 1, Some("EA04-P2.mp4"), &[(700.0, 0.9)])];

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(trials)
        .unwrap();

    assert!((report.records[0].pearson_vs_mean - 1.0).abs() < 1e-12);
}

#[test]
fn long_trial_is_compared_with_reference_over_its_own_length() {
    let refs = references(&[("EA03-N1", &[(1.0, 0.0), (9.0, 2.0)])]);
    let trials = vec![trial(
        "7",
        1,
        Some("EA03-N1.mp4"),
        &[(1000.0, 0.0), (3000.0, 1.0)],
    )];

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(trials)
        .unwrap();

    // Filed for averaging at the stimulus horizon.
    let series = report.stimulus_series();
    assert_eq!(series[0].trials[0].1.len(), 2001);

    let reference: RawRatingSeries =
        vec![RatingEvent::new(0.0, 0.0), RatingEvent::new(2.0, 1.0)]
            .into_iter()
            .collect();
    let live: RawRatingSeries = vec![
        RatingEvent::new(0.0, 0.5),
        RatingEvent::new(1.0, 0.0),
        RatingEvent::new(3.0, 1.0),
    ]
    .into_iter()
    .collect();
    let expected = pearson(&resample(&reference, 3.0), &resample(&live, 3.0)).unwrap();

    assert!((report.records[0].pearson_vs_reference - expected).abs() < 1e-12);
}

#[test]
fn stages_must_run_in_order() {
    let refs = references(&[("EA03-N1", &[(1.0, 0.0), (9.0, 2.0)])]);
    let mut pipeline = Pipeline::new(PipelineConfig::default(), &refs);
    assert_eq!(pipeline.stage(), PipelineStage::Ingesting);

    assert!(matches!(
        pipeline.correlate(),
        Err(AnalysisError::StageOrder { .. })
    ));

    pipeline
        .ingest(vec![trial("1", 1, Some("EA03-N1.mp4"), &[(10.0, 0.7)])])
        .unwrap();
    pipeline
        .ingest(vec![trial("2", 1, Some("EA03-N1.mp4"), &[(20.0, 0.1)])])
        .unwrap();
    pipeline.aggregate().unwrap();
    assert_eq!(pipeline.stage(), PipelineStage::Correlating);

    assert!(matches!(
        pipeline.ingest(Vec::new()),
        Err(AnalysisError::StageOrder { .. })
    ));

    let records = pipeline.correlate().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(pipeline.stage(), PipelineStage::Done);
}

#[test]
fn unsorted_samples_are_reordered() {
    let refs = references(&[("EA03-N1", &[(1.0, 0.0), (9.0, 2.0)])]);
    let sorted = trial("1", 1, Some("EA03-N1.mp4"), &[(500.0, 0.2), (1500.0, 0.9)]);
    let shuffled = trial("2", 1, Some("EA03-N1.mp4"), &[(1500.0, 0.9), (500.0, 0.2)]);

    let report = Pipeline::new(PipelineConfig::default(), &refs)
        .run(vec![sorted, shuffled])
        .unwrap();

    assert_eq!(
        report.records[0].pearson_vs_reference,
        report.records[1].pearson_vs_reference
    );
    let series = report.stimulus_series();
    assert_eq!(series[0].trials[0].1, series[0].trials[1].1);
}
