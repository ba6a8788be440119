//! Example of registering a custom front matter format

use frontmatter::{Format, Parser};
use std::collections::BTreeMap;

/// Decodes `key = value` lines
fn unmarshal_ini(data: &[u8], target: &mut BTreeMap<String, String>) -> anyhow::Result<()> {
    let text = std::str::from_utf8(data)?;
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected `key = value`, got '{}'", line))?;
        target.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    println!("=== Custom Front Matter Example ===\n");

    let parser = Parser::with_formats(vec![
        Format::new("[meta]", "[/meta]", unmarshal_ini),
        Format::new("<!--", "-->", unmarshal_ini).with_requires_new_line(true),
    ]);

    let documents = [
        "[meta]\ntitle = Custom\nauthor = nzinfo\n[/meta]\n# Custom\n",
        "<!--\ntitle = Comment\n-->\n\nBody after a blank line\n",
        "No front matter here\n",
    ];

    // One buffer reused across documents
    let mut buf = Vec::with_capacity(4096);
    for document in documents {
        let mut meta = BTreeMap::new();
        let body = parser.parse_with_buffer(&mut buf, document.as_bytes(), &mut meta)?;

        println!("meta: {:?}", meta);
        println!("body: {:?}\n", String::from_utf8_lossy(body));
    }

    let mut meta = BTreeMap::new();
    match parser.must_parse("No front matter here\n".as_bytes(), &mut meta) {
        Err(err) if err.is_not_found() => println!("must_parse: {}", err),
        other => anyhow::bail!("unexpected result: {:?}", other.map(|b| b.len())),
    }

    Ok(())
}
