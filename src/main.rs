mod bot;
mod components;
mod config;
#[macro_use]
mod log;

trait ResultLog {
    type OkType;
    fn expect_log(self, msg: &str) -> Self::OkType;
}
impl<T, E: std::fmt::Display> ResultLog for Result<T, E> {
    type OkType = T;
    fn expect_log(self, msg: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) if msg.is_empty() => {
                log_error!("{}", e);
                panic!("{}", e)
            }
            Err(e) => {
                log_error!("{}: {}", msg, e);
                panic!("{}: {}", msg, e)
            }
        }
    }
}

#[tokio::main]
async fn main() {
    log::init().expect_log("Could not install the logger");
    let config = config::Config::read_file("./config.json").expect_log("Could not load the configuration file");
    let mut bot = bot::Bot::new(&config).await.expect_log("");
    bot.start().await.expect_log("Client won't start");
}
