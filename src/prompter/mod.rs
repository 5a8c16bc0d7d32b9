pub mod prompter;
