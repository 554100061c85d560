use crate::api::{attendance, employee, pages, recognition, registration, stream};
use crate::config::Config;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let recognize_limiter = Arc::new(build_limiter(config.rate_recognize_per_min));

    // HTML pages
    cfg.service(web::resource("/").route(web::get().to(pages::dashboard)))
        .service(web::resource("/registrasi").route(web::get().to(pages::registrasi)))
        .service(web::resource("/absensi").route(web::get().to(pages::absensi)))
        .service(web::resource("/pegawai").route(web::get().to(pages::pegawai)))
        .service(web::resource("/riwayat").route(web::get().to(pages::riwayat)))
        // Mutating endpoints, rate limited
        .service(
            web::resource("/registrasi/submit")
                .wrap(register_limiter)
                .route(web::post().to(registration::submit)),
        )
        .service(
            web::resource("/absensi/recognize")
                .wrap(recognize_limiter)
                .route(web::post().to(recognition::recognize)),
        )
        .service(
            web::resource("/pegawai/delete/{employee_id}")
                .route(web::post().to(employee::delete_employee)),
        )
        // Diagnostic camera preview
        .service(web::resource("/video_feed").route(web::get().to(stream::video_feed)))
        // JSON API
        .service(
            web::scope("/api")
                .service(web::resource("/employees").route(web::get().to(employee::list_employees)))
                .service(
                    web::scope("/attendance")
                        .service(web::resource("/today").route(web::get().to(attendance::today)))
                        .service(
                            web::resource("/history").route(web::get().to(attendance::history)),
                        ),
                ),
        );
}
