//! HTML pages. Assets are embedded at build time; all dynamic data comes
//! from the JSON endpoints.

use actix_web::{HttpResponse, Responder};

const DASHBOARD: &str = include_str!("../../static/dashboard.html");
const REGISTRASI: &str = include_str!("../../static/registrasi.html");
const ABSENSI: &str = include_str!("../../static/absensi.html");
const PEGAWAI: &str = include_str!("../../static/pegawai.html");
const RIWAYAT: &str = include_str!("../../static/riwayat.html");

fn html(body: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub async fn dashboard() -> impl Responder {
    html(DASHBOARD)
}

pub async fn registrasi() -> impl Responder {
    html(REGISTRASI)
}

pub async fn absensi() -> impl Responder {
    html(ABSENSI)
}

pub async fn pegawai() -> impl Responder {
    html(PEGAWAI)
}

pub async fn riwayat() -> impl Responder {
    html(RIWAYAT)
}
