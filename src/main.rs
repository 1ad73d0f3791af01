fn main() {
    liquid_html_parser::cli::run();
}
