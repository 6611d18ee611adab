use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use kestrel_core::parser::preparser::preparse;
use kestrel_core::parser::scanner::Scanner;
use kestrel_core::parser::token::{Token, TokenKind};
use kestrel_core::parser::parse_program;
use kestrel_core::source::SourceText;

/// A few hundred lines of representative script: closures, loops,
/// destructuring, object literals and regexps.
fn workload() -> String {
    let unit = r#"
var counter = (function () {
  var count = 0;
  return {
    increment: function (step = 1) { count += step; return count; },
    get value() { return count; },
    reset() { count = 0; }
  };
})();

function tokenize(text) {
  var tokens = [], pattern = /\s*(\d+|[a-z_]\w*|\S)/gi, match;
  while ((match = pattern.exec(text)) !== null) {
    tokens.push({ text: match[1], index: match.index });
  }
  return tokens;
}

for (let [key, { value, label = key }] of Object.entries(table)) {
  if (value > 10 && !label.startsWith("_")) {
    switch (typeof value) {
      case "number": total = total * 2 + value; break;
      default: continue;
    }
  }
}

const sum = (...values) => values.reduce((a, b) => a + b, 0);
"#;
    unit.repeat(40)
}

// ---------------------------------------------------------------------------
// Scanner throughput
// ---------------------------------------------------------------------------

fn bench_scan(c: &mut Criterion) {
    // Without parser feedback a `/` always scans as division.
    let source = SourceText::new(&workload().replace(r"/\s*(\d+|[a-z_]\w*|\S)/gi", "re"));
    c.bench_function("scan_workload", |b| {
        b.iter(|| {
            let mut scanner = Scanner::new(&source);
            let mut token = Token::default();
            let mut count = 0usize;
            loop {
                let kind = scanner.next_token(&mut token, false);
                if kind == TokenKind::Eof || kind.is_error() {
                    break;
                }
                count += 1;
            }
            black_box(count)
        });
    });
}

// ---------------------------------------------------------------------------
// Full parse vs. pre-parse
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let source = SourceText::new(&workload());
    c.bench_function("parse_workload", |b| {
        b.iter(|| parse_program(black_box(&source)));
    });
}

fn bench_preparse(c: &mut Criterion) {
    let source = SourceText::new(&workload());
    c.bench_function("preparse_workload", |b| {
        b.iter(|| preparse(black_box(&source)));
    });
}

// ---------------------------------------------------------------------------
// Speculation-heavy input
// ---------------------------------------------------------------------------

fn bench_nested_arrows(c: &mut Criterion) {
    // Every `(` could open an arrow parameter list or a parenthesized
    // expression.
    let depth = 64;
    let text = format!("x = {}a{};", "(".repeat(depth), ")".repeat(depth));
    let source = SourceText::new(&text);
    c.bench_function("parse_nested_parens", |b| {
        b.iter(|| parse_program(black_box(&source)));
    });
}

// ---------------------------------------------------------------------------
// Group & main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_scan, bench_parse, bench_preparse, bench_nested_arrows);
criterion_main!(benches);
