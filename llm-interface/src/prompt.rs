use shoprec_core::{CoreError, Product};

/// Builds the re-ranking instruction. History and candidates are embedded as
/// pretty-printed JSON using the catalog field names.
pub fn build_prompt(
    history: &[&Product],
    candidates: &[&Product],
    k: usize,
) -> Result<String, CoreError> {
    let history_json = serde_json::to_string_pretty(history)?;
    let candidates_json = serde_json::to_string_pretty(candidates)?;

    Ok(format!(
        r#"You are a recommendation assistant for an online electronics and home goods store.

Here is the user's interaction history (products they wishlisted, added to cart, or purchased):
{history_json}

Here are the candidate products generated by the baseline recommender:
{candidates_json}

Your job:

1. Re-rank ONLY these candidate products so that they best match THIS SPECIFIC USER'S preferences.
   Use ONLY the real attributes in the data: category, tags, price, and rating.
   Pay special attention to:
   - categories the user interacted with before,
   - tags that appear often in previously liked or purchased products,
   - similar price range and rating.

2. Return ONLY the top {k} products from the candidate list.
   - Do not invent new products.
   - Do not recommend more than {k} products.
   - If there are fewer than {k} candidates, return all of them.

3. For each recommended product, write ONE short sentence explaining why it matches the user's preferences,
   using only the attributes above.

Answer in English only.

Respond ONLY with valid JSON with this exact structure:
{{
  "recommendations": [
    {{
      "id": "product_id_here",
      "reason": "the explanation here"
    }}
  ]
}}
No extra text, no markdown, no comments, no other fields.
"#
    ))
}
