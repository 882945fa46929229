//! The single source of truth for every instruction string sent to an image
//! model. Model output quality is entirely prompt-determined, so these live
//! here as one versioned template set instead of being inlined per call site;
//! all call paths (initial create, click edit, every provider) go through the
//! same builders.

use mirage_shared::Viewport;

/// Bumped whenever the wording changes in a way that visibly alters output.
pub const TEMPLATE_VERSION: &str = "v3";

/// The hard physical framing constraints. Image models love to render a
/// browser mockup with padding around it; these lines are what keep the
/// output a full-bleed page screenshot.
fn framing_constraints(viewport: Viewport) -> String {
    format!(
        "CRITICAL REQUIREMENTS:\n\
         - DO NOT MAKE IT A MOCKUP, THERE SHOULD BE NOTHING ON THE IMAGE OTHER THAN THE SITE ALL THE WAY TO THE EDGES\n\
         - DO NOT INCLUDE THE BROWSER HEADER, JUST THE SITE\n\
         - NO BUFFER, NO BORDER, NO PADDING AROUND THE SITE CONTENT\n\
         - FILL THE ENTIRE {w}x{h} IMAGE EDGE TO EDGE WITH WEBSITE CONTENT ONLY\n\
         - DO A VERY GOOD JOB, DO NOT BE AFRAID TO BE CREATIVE\n\
         - ASSUME EVERYTHING THE USER ASKS FOR OR CLICKS ON EXISTS IN THE MOST INTERESTING WAY POSSIBLE",
        w = viewport.width,
        h = viewport.height,
    )
}

/// Builds the instruction for a fresh (non-click) generation.
///
/// `context` is the optional pre-search summary; it is appended as grounding
/// so well-known sites come out with roughly correct branding.
pub fn build_generate_prompt(prompt: &str, viewport: Viewport, context: Option<&str>) -> String {
    let mut out = format!(
        "Generate a modern, professional website design as a single webpage screenshot. {}.\n\n\
         {}\n\n\
         The design should be clean, modern, and look like a real website with:\n\
         - A header with navigation\n\
         - Hero section with compelling content\n\
         - Well-organized sections\n\
         - Professional typography and spacing\n\
         - Modern color scheme and layout\n\
         - High-quality, polished appearance\n\n\
         Make it look like a screenshot of an actual website, not a mockup or wireframe. \
         Fill the entire {w}x{h} image with just the website content, edge to edge.",
        prompt,
        framing_constraints(viewport),
        w = viewport.width,
        h = viewport.height,
    );

    if let Some(context) = context {
        out.push_str("\n\nKnown facts about this site, use them for accuracy:\n");
        out.push_str(context);
    }

    out
}

pub struct EditPromptArgs<'a> {
    /// The session's original intent, included verbatim for continuity.
    pub initial_prompt: &'a str,
    pub viewport: Viewport,
    /// Text the user typed into a detected input field, if any.
    pub user_text: Option<&'a str>,
    /// Auxiliary grounding from the click classifier or a context pre-search.
    pub click_analysis: Option<&'a str>,
}

/// Builds the instruction for a click-edit. The marker instruction and the
/// dramatic-change demand are not optional: model edits are naturally
/// conservative, and without them the output is near-identical to the input,
/// which kills the evolving-website illusion.
pub fn build_edit_prompt(args: EditPromptArgs<'_>) -> String {
    let mut out = format!(
        "The user clicked at the position marked by the red dot on this website image.\n\n\
         {}\n\n\
         IMPORTANT: Make DRAMATIC and OBVIOUS changes to this website. Either:\n\
         1. Navigate to a completely different page (like a product page, cart, contact page, etc.)\n\
         2. Add significant new content sections, menus, or elements\n\
         3. Change the layout substantially\n\
         4. Show a modal, popup, or overlay\n\n\
         Think about what would normally happen on a website if the user clicked the element \
         shown by the red dot. Make the change VERY obvious and dramatic.\n\n\
         Original prompt: \"{}\"",
        framing_constraints(args.viewport),
        args.initial_prompt,
    );

    if let Some(text) = args.user_text {
        out.push_str(&format!("\n\nUser entered text: \"{}\"", text));
    }

    out.push_str(&format!(
        "\n\nGenerate a completely new and visibly different {w}x{h} website image that shows \
         major evolution. Fill the entire image edge to edge with website content only.",
        w = args.viewport.width,
        h = args.viewport.height,
    ));

    if let Some(analysis) = args.click_analysis {
        out.push_str(&format!("\n\nClick analysis: {}", analysis));
    }

    out
}

/// Wraps a caller-supplied edit instruction in the same framing constraints
/// the session flow uses, for clients driving `/edit-image` directly.
pub fn frame_edit_prompt(edit_prompt: &str, viewport: Viewport) -> String {
    format!(
        "{}\n\n{}\n\nFill the entire {w}x{h} image with just the website content, edge to edge, \
         no buffer or border around the site content.",
        edit_prompt,
        framing_constraints(viewport),
        w = viewport.width,
        h = viewport.height,
    )
}

/// Turns the address-bar input into a generation prompt. Bare search terms
/// pass through; URL-shaped input is reduced to its domain.
pub fn prompt_for_address(input: &str) -> String {
    let input = input.trim();
    let lowered = input.to_ascii_lowercase();

    if lowered.contains("google.com") {
        return "Google homepage with search bar and Google logo".to_string();
    }

    let looks_like_url = !input.contains(' ') && input.contains('.');
    if looks_like_url {
        let domain = input
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.")
            .split('/')
            .next()
            .unwrap_or(input);
        format!(
            "Professional website for {}. Create a modern, clean homepage design",
            domain
        )
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_shared::Viewport;

    #[test]
    fn edit_prompt_carries_every_required_instruction() {
        let prompt = build_edit_prompt(EditPromptArgs {
            initial_prompt: "A minimalist portfolio site for a photographer",
            viewport: Viewport::new(1280, 800),
            user_text: None,
            click_analysis: None,
        });
        assert!(prompt.contains("red dot"));
        // Verbatim original intent for continuity
        assert!(prompt.contains("\"A minimalist portfolio site for a photographer\""));
        assert!(prompt.contains("DRAMATIC and OBVIOUS"));
        assert!(prompt.contains("EDGE TO EDGE"));
        // The actual viewport, not a hardcoded canvas
        assert!(prompt.contains("1280x800"));
        assert!(!prompt.contains("1024x1024"));
    }

    #[test]
    fn user_text_is_embedded_verbatim() {
        let prompt = build_edit_prompt(EditPromptArgs {
            initial_prompt: "an online bookstore",
            viewport: Viewport::default(),
            user_text: Some("sourdough for beginners"),
            click_analysis: None,
        });
        assert!(prompt.contains("User entered text: \"sourdough for beginners\""));
    }

    #[test]
    fn click_analysis_supplements_but_never_replaces_the_change_instruction() {
        let prompt = build_edit_prompt(EditPromptArgs {
            initial_prompt: "a news site",
            viewport: Viewport::default(),
            user_text: None,
            click_analysis: Some("The user clicked the subscribe button."),
        });
        assert!(prompt.contains("Click analysis: The user clicked the subscribe button."));
        assert!(prompt.contains("DRAMATIC and OBVIOUS"));
        // Grounding is appended after the core instruction
        assert!(prompt.rfind("Click analysis").unwrap() > prompt.find("DRAMATIC").unwrap());
    }

    #[test]
    fn generate_prompt_embeds_viewport_and_optional_context() {
        let bare = build_generate_prompt("a vegan restaurant", Viewport::new(1536, 1024), None);
        assert!(bare.contains("a vegan restaurant"));
        assert!(bare.contains("1536x1024"));
        assert!(!bare.contains("Known facts"));

        let grounded = build_generate_prompt(
            "wikipedia.org",
            Viewport::default(),
            Some("White background, left sidebar, serif wordmark."),
        );
        assert!(grounded.contains("Known facts about this site"));
        assert!(grounded.contains("left sidebar"));
    }

    #[test]
    fn framed_edit_prompt_keeps_the_caller_instruction_first() {
        let framed = frame_edit_prompt("Open the shopping cart.", Viewport::new(1024, 768));
        assert!(framed.starts_with("Open the shopping cart."));
        assert!(framed.contains("CRITICAL REQUIREMENTS"));
        assert!(framed.contains("1024x768"));
    }

    #[test]
    fn address_input_maps_to_a_generation_prompt() {
        assert_eq!(
            prompt_for_address("https://www.google.com/search"),
            "Google homepage with search bar and Google logo"
        );
        assert_eq!(
            prompt_for_address("https://www.example.com/about"),
            "Professional website for example.com. Create a modern, clean homepage design"
        );
        // Free-text prompts pass through untouched
        assert_eq!(
            prompt_for_address("a retro arcade landing page"),
            "a retro arcade landing page"
        );
    }
}
