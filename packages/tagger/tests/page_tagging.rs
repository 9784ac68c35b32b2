//! Tagging whole pages: every identity written must point back at the
//! element it was written onto.

use liveedit_protocol::{Identity, IDENTITY_ATTR};
use liveedit_tagger::{Tagger, TaggerOptions};

const PAGE: &str = r#"import Head from "next/head";
import { Button } from "@/components/ui/button";
import type { AppProps } from "next/app";

export default function Landing({ Component, pageProps }: AppProps) {
  const items: string[] = ["one", "two"];

  return (
    <>
      <Head>
        <title>Landing</title>
      </Head>
      <main className="min-h-screen">
        <h1 className="text-4xl">Hello World</h1>
        <ul>
          {items.map((item) => (
            <li key={item}>{item}</li>
          ))}
        </ul>
        <Button variant="outline" onClick={() => alert("hi")}>
          Outline Button
        </Button>
        <Component {...pageProps} />
      </main>
    </>
  );
}
"#;

fn identities(code: &str) -> Vec<Identity> {
    let marker = format!("{}=\"", IDENTITY_ATTR);
    code.match_indices(&marker)
        .filter_map(|(index, _)| {
            let rest = &code[index + marker.len()..];
            let end = rest.find('"')?;
            Identity::parse(&rest[..end])
        })
        .collect()
}

fn line_col_char(source: &str, line: u32, column: u32) -> Option<char> {
    let text = source.lines().nth(line as usize - 1)?;
    let units: Vec<u16> = text.encode_utf16().collect();
    char::decode_utf16(units.get(column as usize..)?.iter().copied())
        .next()?
        .ok()
}

#[test]
fn test_every_identity_points_at_its_tag() {
    let mut tagger = Tagger::new(TaggerOptions::default()).unwrap();
    let report = tagger.tag_file(PAGE, "src/pages/landing.tsx");

    let found = identities(&report.code);
    assert_eq!(found.len(), report.inserted);
    // main, h1, ul, li, Button, Component
    assert_eq!(found.len(), 6);

    for identity in &found {
        assert_eq!(identity.file_path, "src/pages/landing.tsx");
        assert_eq!(identity.to_encoded(), identity.raw);
        assert_eq!(
            line_col_char(PAGE, identity.line, identity.column),
            Some('<'),
            "identity {} does not point at a tag",
            identity
        );
    }
}

#[test]
fn test_identities_are_unique_per_location() {
    let mut tagger = Tagger::new(TaggerOptions::default()).unwrap();
    let code = tagger.tag(PAGE, "src/pages/landing.tsx");

    let mut raw: Vec<String> = identities(&code).into_iter().map(|i| i.raw).collect();
    let total = raw.len();
    raw.sort();
    raw.dedup();
    assert_eq!(raw.len(), total);
}

#[test]
fn test_retagging_changes_nothing() {
    let mut tagger = Tagger::new(TaggerOptions::default()).unwrap();
    let once = tagger.tag(PAGE, "src/pages/landing.tsx");
    let report = tagger.tag_file(&once, "src/pages/landing.tsx");

    assert_eq!(report.inserted, 0);
    assert_eq!(report.code, once);
}
