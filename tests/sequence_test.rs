use almanac::{
    arclamp_sequences, science_sequences, Exposure, ImageType, Observatory, Sequence,
    SequenceOptions,
};

mod common;
use common::{arclamp, base, object, on_disk};

/// A timeline mixing two fields, a calibration block, and a missing placeholder.
fn mixed_timeline() -> Vec<Exposure> {
    let mut exposures = vec![
        arclamp(1, 12.994),
        arclamp(2, 13.499),
        object(3, 100, 7_001),
        object(4, 100, 7_001),
        object(5, 100, 7_001),
        // placeholder severing the run at offset 6
        object(7, 100, 7_001),
        object(8, 101, 7_002),
        arclamp(9, 12.994),
    ];
    exposures.insert(5, Exposure::missing(Observatory::Apo, common::MJD, base() + 6));
    exposures.sort_by_key(|e| e.exposure);
    exposures
}

#[test]
fn sequences_are_disjoint_and_ascending() {
    let exposures = mixed_timeline();
    let sequences = science_sequences(&exposures, &SequenceOptions::default());

    let mut previous_end = i64::MIN;
    for &(start, end) in &sequences {
        assert!(start <= end);
        assert!(start > previous_end, "sequences must not overlap");
        previous_end = end;
    }
}

#[test]
fn members_of_a_sequence_share_the_grouping_key() {
    let exposures = mixed_timeline();
    let sequences = science_sequences(&exposures, &SequenceOptions::default());

    for &(start, end) in &sequences {
        let members: Vec<&Exposure> = exposures
            .iter()
            .filter(|e| (start..=end).contains(&e.exposure))
            .collect();
        // Every number in [start, end] is present in the filtered timeline...
        assert_eq!(members.len() as i64, end - start + 1);
        // ...and shares one key; placeholders never fall inside a range.
        for member in &members {
            assert_eq!(member.science_key(), members[0].science_key());
            assert!(member.path_exists());
        }
    }
}

#[test]
fn missing_placeholder_severs_same_key_run() {
    let exposures = mixed_timeline();
    let sequences = science_sequences(&exposures, &SequenceOptions::default());
    assert_eq!(
        sequences,
        vec![
            (base() + 3, base() + 5),
            (base() + 7, base() + 7),
            (base() + 8, base() + 8),
        ]
    );
}

#[test]
fn arclamp_sequences_group_on_dither_position() {
    let exposures = mixed_timeline();
    let sequences = arclamp_sequences(&exposures, &SequenceOptions::default());
    // Offsets 1 and 2 differ in dither; offset 9 is far from both.
    assert_eq!(
        sequences,
        vec![
            (base() + 1, base() + 1),
            (base() + 2, base() + 2),
            (base() + 9, base() + 9),
        ]
    );
}

#[test]
fn empty_timeline_detects_nothing() {
    assert_eq!(
        science_sequences(&[], &SequenceOptions::default()),
        Vec::<Sequence>::new()
    );
    assert_eq!(
        arclamp_sequences(&[], &SequenceOptions::default()),
        Vec::<Sequence>::new()
    );
}

#[test]
fn single_exposure_is_a_valid_sequence() {
    let exposures = vec![object(1, 100, 7_001)];
    assert_eq!(
        science_sequences(&exposures, &SequenceOptions::default()),
        vec![(base() + 1, base() + 1)]
    );
}

#[test]
fn timeline_of_only_calibrations_has_no_science_sequences() {
    let exposures = vec![arclamp(1, 12.994), on_disk(2, ImageType::Dark)];
    assert!(science_sequences(&exposures, &SequenceOptions::default()).is_empty());
}
