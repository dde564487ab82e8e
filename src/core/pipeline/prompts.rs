use super::types::{
    CompanyProfile, GenerationOptions, MarketIntelligence, ParsedDocument, TenderAnalysis,
};

/// Upper bound on document text inlined into a prompt. Providers accept
/// prompts in the tens of thousands of characters; beyond that the tail is
/// dropped rather than the call rejected.
const DOC_EXCERPT_CHARS: usize = 24_000;

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(DOC_EXCERPT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn profile_block(profile: &CompanyProfile) -> String {
    format!(
        "Company: {}\nSector: {}\nDescription: {}\nCertifications: {}\nReference projects: {}",
        profile.name,
        profile.sector,
        profile.description,
        profile.certifications.join(", "),
        profile.reference_projects.join(", "),
    )
}

pub fn parser_prompt(document_text: &str, options: &GenerationOptions) -> String {
    let max_sections = options.max_sections.unwrap_or(8);
    format!(
        "You are analyzing a public procurement tender document.\n\
         Extract its structure and return ONLY a JSON object with these fields:\n\
         {{\"title\": string, \"buyer\": string, \"sector\": string, \
         \"deadline\": string or null (ISO date), \"summary\": string, \
         \"response_sections\": [string] (at most {max_sections} sections the bid response must contain), \
         \"entities\": [string] (organizations, locations, lot numbers)}}\n\n\
         Document:\n{}",
        excerpt(document_text)
    )
}

pub fn intelligence_prompt(parsed: &ParsedDocument) -> String {
    format!(
        "Provide market context for a public tender.\n\
         Buyer: {}\nSector: {}\nTender: {}\n\n\
         Return ONLY a JSON object: {{\"buyer_profile\": string, \
         \"sector_trends\": string, \"competitors\": [string], \"notes\": string}}",
        parsed.buyer, parsed.sector, parsed.title
    )
}

pub fn analyst_prompt(
    parsed: &ParsedDocument,
    intelligence: Option<&MarketIntelligence>,
    profile: &CompanyProfile,
) -> String {
    let market = match intelligence {
        Some(mi) => format!(
            "Market context:\nBuyer profile: {}\nSector trends: {}\nKnown competitors: {}",
            mi.buyer_profile,
            mi.sector_trends,
            mi.competitors.join(", ")
        ),
        None => "Market context: unavailable".to_string(),
    };
    format!(
        "Score the fit between a company and a tender.\n\n\
         Tender: {}\nBuyer: {}\nSummary: {}\n\n{}\n\n{}\n\n\
         Return ONLY a JSON object: {{\"fit_score\": integer 0-100, \
         \"go_no_go\": \"go\"|\"review\"|\"no_go\", \"strengths\": [string], \
         \"risks\": [string], \"summary\": string}}",
        parsed.title,
        parsed.buyer,
        parsed.summary,
        market,
        profile_block(profile)
    )
}

pub fn writer_prompt(
    section: &str,
    parsed: &ParsedDocument,
    analysis: Option<&TenderAnalysis>,
    profile: &CompanyProfile,
    options: &GenerationOptions,
) -> String {
    let angle = match analysis {
        Some(a) => format!(
            "Lean on these strengths: {}. Address these risks where relevant: {}.",
            a.strengths.join(", "),
            a.risks.join(", ")
        ),
        None => String::new(),
    };
    let tone = options.tone.as_deref().unwrap_or("professional");
    let language = options.language.as_deref().unwrap_or("the tender's language");
    format!(
        "Draft the \"{section}\" section of a bid response for the tender \"{}\" \
         issued by {}.\n\n{}\n\n{angle}\n\n\
         Write in a {tone} tone, in {language}. Return the section text only, \
         no JSON, no markdown fences.",
        parsed.title,
        parsed.buyer,
        profile_block(profile)
    )
}

pub fn reviewer_prompt(parsed: &ParsedDocument, sections: &[(String, String)]) -> String {
    let mut drafted = String::new();
    for (name, text) in sections {
        drafted.push_str(&format!("## {}\n{}\n\n", name, text));
    }
    format!(
        "Review this drafted bid response for the tender \"{}\".\n\
         Expected sections: {}\n\nDraft:\n{}\n\
         Return ONLY a JSON object: {{\"completeness_score\": integer 0-100, \
         \"issues\": [string], \"verdict\": string}}",
        parsed.title,
        parsed.response_sections.join(", "),
        drafted
    )
}

/// Condensed single-prompt variant used by the unattended batch path: one
/// generation call instead of the five-stage pipeline.
pub fn batch_analysis_prompt(document_text: &str) -> String {
    format!(
        "You are scoring a public procurement tender as a sales lead.\n\
         Read the document and return ONLY a JSON object: \
         {{\"fit_score\": integer 0-100, \"go_no_go\": \"go\"|\"review\"|\"no_go\", \
         \"strengths\": [string], \"risks\": [string], \"summary\": string}}\n\n\
         Document:\n{}",
        excerpt(document_text)
    )
}
