use proptest::prelude::*;
use tokio::io::BufReader;

use pipexec::exec::NullObserver;
use pipexec::exec::TriggerSet;
use pipexec::exec::scanner::{OutputLines, TriggerOutcome, collect_lines, scan_until_triggered};

fn scan(lines: &[String], triggers: &[String]) -> (TriggerOutcome, Vec<String>) {
    let data: String = lines.iter().map(|l| format!("{l}\n")).collect();
    let set = TriggerSet::substrings(triggers.iter().cloned());

    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    rt.block_on(async {
        let mut reader = OutputLines::new(BufReader::new(data.as_bytes()));
        let outcome = scan_until_triggered(&mut reader, &set, "prop", &NullObserver)
            .await
            .expect("in-memory scan");
        let rest = collect_lines(&mut reader).await.expect("in-memory drain");
        (outcome, rest)
    })
}

proptest! {
    /// Whatever the output looks like, the scan stops at the first line
    /// containing any trigger and the rest of the stream is exactly what
    /// follows that line.
    #[test]
    fn remaining_lines_are_exactly_those_after_the_first_match(
        lines in proptest::collection::vec("[a-d ]{0,8}", 0..30),
        triggers in proptest::collection::vec("[a-d]{1,3}", 0..4),
    ) {
        let (outcome, rest) = scan(&lines, &triggers);

        let expected_pos = lines
            .iter()
            .position(|l| triggers.iter().any(|t| l.contains(t.as_str())));

        match (outcome, expected_pos) {
            (TriggerOutcome::Matched { line, index, .. }, Some(pos)) => {
                prop_assert_eq!(&line, &lines[pos]);
                let first = triggers.iter().position(|t| line.contains(t.as_str()));
                prop_assert_eq!(Some(index), first);
                prop_assert_eq!(rest, lines[pos + 1..].to_vec());
            }
            (TriggerOutcome::Exhausted { lines_scanned }, None) => {
                prop_assert_eq!(lines_scanned, lines.len());
                prop_assert!(rest.is_empty());
            }
            (outcome, pos) => {
                prop_assert!(false, "scan outcome {:?} disagrees with expected position {:?}", outcome, pos);
            }
        }
    }
}
