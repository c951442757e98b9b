use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use injury_edge::impact_registry::{BannedSet, ImpactRegistry};
use injury_edge::injury_report::{Classifier, ClassifierConfig, InjuryReport};
use injury_edge::lines::{LineEntry, LineSource, StaticLineSource};
use injury_edge::projection::project;

fn sample_report_html(rows: usize) -> String {
    let mut html = String::from("<html><body><table>");
    for idx in 0..rows {
        let status = if idx % 7 == 0 { "Out" } else { "Day-To-Day" };
        html.push_str(&format!(
            "<tr><td>Player {idx}</td><td>G</td><td>Jan 1</td><td>{status}</td><td>Knee.</td></tr>"
        ));
    }
    html.push_str("<tr><td>Joel Embiid</td><td>C</td><td>Jan 9</td><td>Out</td><td>Knee.</td></tr>");
    html.push_str("</table></body></html>");
    html
}

fn bench_report_parse(c: &mut Criterion) {
    let html = sample_report_html(400);
    c.bench_function("injury_report_parse", |b| {
        b.iter(|| {
            let report = InjuryReport::parse(black_box(&html)).unwrap();
            black_box(report.rows.len());
        })
    });
}

fn bench_classify(c: &mut Criterion) {
    let report = InjuryReport::parse(&sample_report_html(400)).unwrap();
    let registry = ImpactRegistry::builtin();
    let classifier = Classifier::new(&ClassifierConfig::default());
    c.bench_function("classify_rows", |b| {
        b.iter(|| {
            let banned = classifier.classify(Ok(black_box(report.clone())), &registry);
            black_box(banned.len());
        })
    });
}

fn bench_project(c: &mut Criterion) {
    let registry = ImpactRegistry::builtin();
    let banned: BannedSet = registry.stars().map(str::to_string).collect();
    let boosts = registry.boost_table(&banned, None);
    let mut lines = StaticLineSource::builtin().fetch_lines().unwrap();
    lines.extend((0..500).map(|idx| LineEntry::new(format!("Bench Player {idx}"), 10.0)));
    c.bench_function("project_board", |b| {
        b.iter(|| {
            let results = project(black_box(&lines), &boosts, &banned);
            black_box(results.len());
        })
    });
}

criterion_group!(benches, bench_report_parse, bench_classify, bench_project);
criterion_main!(benches);
