//! Prompt template for turning one lesson page into slide JSON.

/// What the model needs to know about the chunk it is converting.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPrompt<'a> {
    /// 1-based position of this page among the pages being converted.
    pub part: usize,
    pub total: usize,
    /// Titles of every slide accumulated so far, in deck order.
    pub existing_titles: &'a [&'a str],
    pub content: &'a str,
}

impl ChunkPrompt<'_> {
    pub fn is_final_batch(&self) -> bool {
        self.part == self.total
    }

    pub fn render(&self) -> String {
        let memory = self.existing_titles.join(" | ");
        format!(
            r#"SYSTEM: You are a JSON-only API. You are NOT a chatbot.
INSTRUCTION: Convert the educational content below into a slide deck JSON structure.

GLOBAL CONTEXT:
You are processing Part {part} of {total} of a single lesson.

MEMORY (SLIDES ALREADY CREATED):
[ {memory} ]

DUPLICATE AND CONTINUATION RULES (check MEMORY first):
1. New topic: create a standard slide.
2. Topic already in MEMORY but the text adds new details: create a continuation slide titled "<Topic> (Continued)" or "<Topic>: Key Details". Do not repeat the definition.
3. Text that only summarizes or repeats earlier material: skip it.

OUTPUT CONSTRAINTS:
1. Output ONLY valid JSON starting with '{{' and ending with '}}'.
2. No markdown formatting.
3. No meta-references such as "According to the text".

CONTENT POLICY:
- Definitions are kept exact: copy technical terms and formal definitions word for word.
- Explanations are simplified: restate the how and why in plain language a 10-year-old can follow.
- Slide body: natural sentences, at most 60 words. Use "- " bullet lines only when listing 3 or more distinct items.
- Talking points: a conversational script that explains the slide body with a relatable everyday scenario.
- Comparisons or structured data: put them in "tableData" instead of the body.
- Assessments: only when the content has an explicit "Quiz", "Summative Test" or "End-of-Lesson Assessment" header. Multiple choice, at most 2 questions per slide, followed by an answer key slide.
- References: only when IS FINAL BATCH is true and the content has a "References" header. Copy the list verbatim.

REQUIRED JSON SCHEMA:
{{
  "slides": [
    {{
      "title": "Deliberation: The Process",
      "body": "Deliberation is the systematic exploration of all possible choices. We weigh the advantages and disadvantages of each option before committing.",
      "tableData": {{ "headers": ["Option", "Pros", "Cons"], "rows": [["Walk", "Free", "Slow"]] }},
      "notes": {{
        "talkingPoints": "Imagine planning a birthday surprise for your grandmother...",
        "interactiveElement": "Ask the class to list two options they weighed this week.",
        "slideTiming": "3 mins"
      }}
    }}
  ]
}}
Use "tableData": null when the slide has no table.

INPUT DATA CONTEXT:
- CURRENT BATCH: {part} of {total}
- IS FINAL BATCH: {is_final}

CONTENT TO PROCESS:
{content}
"#,
            part = self.part,
            total = self.total,
            memory = memory,
            is_final = self.is_final_batch(),
            content = self.content,
        )
    }
}
