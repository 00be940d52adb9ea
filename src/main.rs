use picture_session::config::Settings;
use picture_session::services::{Collaborators, SessionService};
use picture_session::{startup, ui};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let settings = Settings::from_env();
    let commands = ui::spawn_stdin_reader();

    let collaborators = Collaborators::system(
        &settings,
        Box::new(ui::LogDisplaySink::new()),
        Box::new(ui::PromptConfirm::new(commands.clone())),
    );
    let mut session = SessionService::new(settings, collaborators);

    let paths = startup::startup_paths_from_args(std::env::args_os().skip(1));
    if !startup::configure_startup_opening(&mut session, &paths) {
        println!("No file given. Use 'o <path>...' to open pictures, 'q' to quit.");
    }

    ui::run_command_loop(&mut session, commands);

    Ok(())
}
