//! Prompt assembly for the analysis request.

use crate::models::ExtractedArticle;

/// Instruction appended after the articles.
pub const ANALYSIS_INSTRUCTION: &str = "Please provide your analysis based on the above articles. Focus on the potential reasons behind a recent change in stock price.";

/// Concatenate the articles, in order, into a single user prompt.
///
/// The output depends only on the titles and texts passed in, so the same
/// article list always produces byte-identical text. Article text is passed
/// through untruncated.
pub fn build_prompt(articles: &[ExtractedArticle]) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("Here are {} news articles:\n\n", articles.len()));
    for (idx, article) in articles.iter().enumerate() {
        prompt.push_str(&format!(
            "Article {}:\nTitle: {}\nContent: {}\n\n",
            idx + 1,
            article.title(),
            article.full_text
        ));
    }
    prompt.push_str(ANALYSIS_INSTRUCTION);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleMetadata;

    fn article(title: &str, text: &str) -> ExtractedArticle {
        ExtractedArticle::new(
            ArticleMetadata {
                title: title.to_string(),
                link: format!("https://example.com/{title}"),
                ..Default::default()
            },
            text.to_string(),
        )
    }

    #[test]
    fn test_build_prompt_exact_layout() {
        let prompt = build_prompt(&[
            article("Acme rallies", "Shares up."),
            article("Acme guidance", "Outlook raised."),
        ]);

        let expected = "Here are 2 news articles:\n\n\
            Article 1:\nTitle: Acme rallies\nContent: Shares up.\n\n\
            Article 2:\nTitle: Acme guidance\nContent: Outlook raised.\n\n\
            Please provide your analysis based on the above articles. Focus on the potential reasons behind a recent change in stock price.";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let articles = vec![article("A", "one"), article("B", "two"), article("C", "three")];
        assert_eq!(build_prompt(&articles), build_prompt(&articles.clone()));
    }

    #[test]
    fn test_header_count_matches_input() {
        for n in 1..=5 {
            let articles: Vec<_> = (0..n).map(|i| article(&format!("T{i}"), "x")).collect();
            let prompt = build_prompt(&articles);
            assert!(prompt.starts_with(&format!("Here are {n} news articles:\n\n")));
            assert_eq!(prompt.matches("\nTitle: ").count(), n);
        }
    }

    #[test]
    fn test_long_text_is_not_truncated() {
        let body = "word ".repeat(50_000);
        let prompt = build_prompt(&[article("Long", &body)]);
        assert!(prompt.contains(&body));
        assert!(prompt.ends_with(ANALYSIS_INSTRUCTION));
    }
}
