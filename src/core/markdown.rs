//! Facts about a skill document's Markdown: fenced code blocks, headings,
//! checklists and word counts. Everything except `code_blocks` ignores text
//! inside fences, so a `# comment` in a bash snippet is never a heading.

use crate::domain::model::CodeBlock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub line: usize,
}

struct Fence {
    marker: char,
    len: usize,
}

/// Opening or closing fence: up to three spaces of indentation, then at least
/// three backticks or tildes.
fn parse_fence(line: &str) -> Option<(Fence, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    // backtick fences cannot carry backticks in the info string
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some((Fence { marker, len }, info))
}

fn closes(open: &Fence, line: &str) -> bool {
    match parse_fence(line) {
        Some((fence, info)) => fence.marker == open.marker && fence.len >= open.len && info.is_empty(),
        None => false,
    }
}

/// Walks the document line by line, calling `visit` for every line outside a
/// code fence with its 1-based line number.
fn for_each_prose_line<'a>(content: &'a str, mut visit: impl FnMut(usize, &'a str)) {
    let mut open: Option<Fence> = None;
    for (idx, line) in content.lines().enumerate() {
        match &open {
            Some(fence) => {
                if closes(fence, line) {
                    open = None;
                }
            }
            None => match parse_fence(line) {
                Some((fence, _)) => open = Some(fence),
                None => visit(idx + 1, line),
            },
        }
    }
}

pub fn code_blocks(content: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(Fence, CodeBlock)> = None;

    for (idx, line) in content.lines().enumerate() {
        if let Some((fence, block)) = current.as_mut() {
            if closes(fence, line) {
                if let Some((_, mut done)) = current.take() {
                    done.terminated = true;
                    blocks.push(done);
                }
            } else {
                block.code.push_str(line);
                block.code.push('\n');
            }
            continue;
        }

        if let Some((fence, info)) = parse_fence(line) {
            let language = info
                .split_whitespace()
                .next()
                .map(|word| word.trim_start_matches('{').trim_start_matches('.'))
                .map(|word| word.split([',', '{', '}']).next().unwrap_or(word))
                .filter(|word| !word.is_empty())
                .map(str::to_lowercase);
            current = Some((
                fence,
                CodeBlock {
                    language,
                    code: String::new(),
                    line: idx + 1,
                    terminated: false,
                },
            ));
        }
    }

    if let Some((_, block)) = current {
        blocks.push(block);
    }
    blocks
}

pub fn headings(content: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    for_each_prose_line(content, |line_no, line| {
        if let Some(heading) = parse_heading(line, line_no) {
            found.push(heading);
        }
    });
    found
}

fn parse_heading(line: &str, line_no: usize) -> Option<Heading> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }
    // closing hashes are decoration
    let text = after.trim().trim_end_matches('#').trim_end().to_string();
    Some(Heading {
        level,
        text,
        line: line_no,
    })
}

/// First level-1 heading, or `"Untitled"`.
pub fn title(content: &str) -> String {
    headings(content)
        .into_iter()
        .find(|h| h.level == 1 && !h.text.is_empty())
        .map(|h| h.text)
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Strips leading emoji, punctuation and numbering such as `2.` or `📋`.
fn normalize_heading(text: &str) -> String {
    text.trim_start_matches(|c: char| !c.is_alphabetic())
        .trim()
        .to_lowercase()
}

pub fn has_section(content: &str, name: &str) -> bool {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return true;
    }
    headings(content)
        .iter()
        .any(|h| normalize_heading(&h.text).starts_with(&wanted))
}

pub fn has_checklist(content: &str) -> bool {
    let mut found = false;
    for_each_prose_line(content, |_, line| {
        let item = line.trim_start();
        let body = item
            .strip_prefix("- ")
            .or_else(|| item.strip_prefix("* "))
            .or_else(|| item.strip_prefix("+ "));
        if let Some(body) = body {
            if body.starts_with("[ ]") || body.starts_with("[x]") || body.starts_with("[X]") {
                found = true;
            }
        }
    });
    found
}

pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

pub fn line_count(content: &str) -> usize {
    content.lines().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Retry Timeout Strategies\n\
\n\
## 📋 Overview\n\
Backoff with jitter.\n\
\n\
```typescript\n\
const delay = base * 2 ** attempt;\n\
```\n\
\n\
```bash\n\
# not a heading\n\
curl -sf http://localhost/health\n\
```\n\
\n\
## 2. Best Practices\n\
- [ ] cap the delay\n\
- [x] add jitter\n";

    #[test]
    fn test_code_blocks_with_language_and_line() {
        let blocks = code_blocks(DOC);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language.as_deref(), Some("typescript"));
        assert_eq!(blocks[0].line, 6);
        assert_eq!(blocks[0].code, "const delay = base * 2 ** attempt;\n");
        assert!(blocks[0].terminated);
        assert_eq!(blocks[1].language.as_deref(), Some("bash"));
    }

    #[test]
    fn test_headings_ignore_fenced_comments() {
        let texts: Vec<String> = headings(DOC).into_iter().map(|h| h.text).collect();
        assert_eq!(
            texts,
            vec!["Retry Timeout Strategies", "📋 Overview", "2. Best Practices"]
        );
    }

    #[test]
    fn test_title_fallback() {
        assert_eq!(title(DOC), "Retry Timeout Strategies");
        assert_eq!(title("## Only a subheading"), "Untitled");
        assert_eq!(title("```sh\n# comment\n```"), "Untitled");
    }

    #[test]
    fn test_sections_are_normalized() {
        assert!(has_section(DOC, "Overview"));
        assert!(has_section(DOC, "best practices"));
        assert!(!has_section(DOC, "Troubleshooting"));
    }

    #[test]
    fn test_checklist_detection() {
        assert!(has_checklist(DOC));
        assert!(!has_checklist("- plain item\n"));
        assert!(!has_checklist("```md\n- [ ] inside a fence\n```\n"));
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let blocks = code_blocks("intro\n```yaml\nkey: value\n");
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].terminated);
        assert_eq!(blocks[0].code, "key: value\n");
    }

    #[test]
    fn test_longer_fence_contains_shorter_one() {
        let content = "````markdown\n```js\nconsole.log(1)\n```\n````\n";
        let blocks = code_blocks(content);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language.as_deref(), Some("markdown"));
        assert!(blocks[0].code.contains("```js"));
    }

    #[test]
    fn test_info_string_attributes() {
        let blocks = code_blocks("```yaml title=\"compose.yml\"\na: 1\n```\n~~~\nplain\n~~~\n");
        assert_eq!(blocks[0].language.as_deref(), Some("yaml"));
        assert_eq!(blocks[1].language, None);
    }

    #[test]
    fn test_counts() {
        assert_eq!(word_count("one two\nthree"), 3);
        assert_eq!(line_count("a\nb\n"), 2);
    }
}
