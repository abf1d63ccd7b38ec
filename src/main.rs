use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    campus_chat::cli::main()
}
