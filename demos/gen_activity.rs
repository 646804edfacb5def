//! Generate a feature lookup table from a small synthetic activity log

fn main() {
    let events = "\
user_id,step_id,timestamp,action
17,32815,1434340848,viewed
17,32815,1434340895,passed
17,32811,1434341100,viewed
17,32812,1434427300,viewed
24,32929,1434358000,viewed
24,32929,1434358100,started_attempt
";

    let submissions = "\
user_id,step_id,timestamp,submission_status
17,32815,1434340890,correct
17,32811,1434341200,wrong
17,32811,1434341350,correct
17,32812,1434427400,correct
24,32929,1434358200,wrong
";

    let events = match learnpulse::ActivityLogAdapter::parse_events_csv(events) {
        Ok(events) => events,
        Err(e) => return eprintln!("Error: {e:?}"),
    };
    let submissions = match learnpulse::ActivityLogAdapter::parse_submissions_csv(submissions) {
        Ok(submissions) => submissions,
        Err(e) => return eprintln!("Error: {e:?}"),
    };

    let table = learnpulse::compute_feature_table(&events, &submissions);
    match learnpulse::FeatureStore::from_table(table).to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
