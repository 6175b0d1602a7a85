//! Binary that emits command-line options markdown to stdout.
//!
//! Used to refresh `docs/command-line-options.md` when the options change.

fn main() {
    print!("{}", materai_cli::render_options_markdown());
}
