pub mod templates;

pub use templates::{
    build_edit_prompt, build_generate_prompt, prompt_for_address, EditPromptArgs,
};
