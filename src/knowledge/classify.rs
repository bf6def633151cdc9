use super::model::Area;

/// Assigns a content item to one of the configured areas.
///
/// Implementations return the matching area's id, or `None` when nothing fits;
/// the snapshot builder then falls back to the first configured area.
pub trait Classifier {
    fn classify(&self, title: &str, content: &str) -> Option<String>;
}

impl<F> Classifier for F
where
    F: Fn(&str, &str) -> Option<String>,
{
    fn classify(&self, title: &str, content: &str) -> Option<String> {
        self(title, content)
    }
}

/// Scores each area by how many of its terms occur in the item text.
///
/// An area's own name always counts as a term. Title hits weigh double.
/// Ties go to the area listed first.
pub struct KeywordClassifier {
    areas: Vec<(String, Vec<String>)>,
}

impl KeywordClassifier {
    pub fn new(areas: &[Area]) -> Self {
        let areas = areas
            .iter()
            .map(|area| {
                let mut terms = area
                    .keywords
                    .iter()
                    .map(|keyword| keyword.trim().to_lowercase())
                    .filter(|keyword| !keyword.is_empty())
                    .collect::<Vec<_>>();
                let name = area.name.trim().to_lowercase();
                if !name.is_empty() {
                    terms.push(name);
                }
                terms.sort();
                terms.dedup();
                (area.id.clone(), terms)
            })
            .collect();

        Self { areas }
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, title: &str, content: &str) -> Option<String> {
        let title = title.to_lowercase();
        let content = content.to_lowercase();

        let mut best: Option<(&str, usize)> = None;
        for (area_id, terms) in &self.areas {
            let score = terms
                .iter()
                .map(|term| {
                    (usize::from(title.contains(term.as_str())) * 2)
                        + usize::from(content.contains(term.as_str()))
                })
                .sum::<usize>();

            if score > 0 && best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((area_id, score));
            }
        }

        best.map(|(area_id, _)| area_id.to_owned())
    }
}
