use lib_config::{config::configuration::Settings, db::db::PgPool};
use crate::routes::health_check::health_check;
use crate::routes::game::games::{
    add_to_my_zone, confirm_delete, details, list_all, my_zone, prepare_add, prepare_delete,
    prepare_edit, strike_out, submit_add, submit_edit,
};
use actix_web::{dev::Server, web, App, HttpServer};
use actix_web_lab::middleware::from_fn;
use middleware::jwt::identity_middleware;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

/**************************************************************/
// Application state to reuse the same code in main and tests
/***************************************************************/
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(pool: PgPool, config: Settings) -> Result<Self, std::io::Error> {
        let listener = if config.service.catalog_service_port == 0 {
            TcpListener::bind("127.0.0.1:0")?
        } else {
            let address = format!("127.0.0.1:{}", config.service.catalog_service_port);
            TcpListener::bind(&address)?
        };

        let actual_port = listener.local_addr()?.port();

        let server = run_server(listener, pool, config).await?;

        Ok(Self {
            port: actual_port,
            server,
        })
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/******************************************/
// Running Server
/******************************************/
pub async fn run_server(
    listener: TcpListener,
    pool: PgPool,
    config: Settings,
) -> Result<Server, std::io::Error> {
    let settings = web::Data::new(config);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(settings.clone())
            .app_data(web::Data::new(pool.clone()))
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1")
                    .wrap(from_fn(identity_middleware))
                    // literal segment first so "{id}" never swallows it
                    .route("/games/new", web::get().to(prepare_add))
                    .route("/games", web::get().to(list_all))
                    .route("/games", web::post().to(submit_add))
                    .route("/games/{id}", web::get().to(details))
                    .route("/games/{id}/edit", web::get().to(prepare_edit))
                    .route("/games/{id}/edit", web::post().to(submit_edit))
                    .route("/games/{id}/delete", web::get().to(prepare_delete))
                    .route("/games/{id}/delete", web::post().to(confirm_delete))
                    .route("/myzone", web::get().to(my_zone))
                    .route("/myzone/add/{id}", web::get().to(add_to_my_zone))
                    .route("/myzone/strikeout/{id}", web::get().to(strike_out)),
            )
    })
    .listen(listener)?
    .run();
    Ok(server)
}
