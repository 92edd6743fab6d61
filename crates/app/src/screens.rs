//! Screen registry
//!
//! Each screen of the ticketing client contributes the announcement it
//! narrates when it becomes active. The real client builds these from its
//! rendered UI; here they are a static registry.

use railtalk_command::Screen;
use railtalk_tts::PageAnnouncement;

pub fn title(screen: Screen) -> &'static str {
    match screen {
        Screen::Home => "Beranda",
        Screen::IntercityBooking => "Tiket Antar Kota",
        Screen::CommuterLine => "Commuter Line",
        Screen::Lrt => "LRT",
        Screen::AirportTrain => "Kereta Bandara",
        Screen::MyTickets => "Tiket Saya",
        Screen::TripPlanner => "Rencana Perjalanan",
        Screen::Settings => "Pengaturan",
    }
}

pub fn page_for(screen: Screen) -> PageAnnouncement {
    let (description, actions, instructions) = match screen {
        Screen::Home => (
            "Menu utama aplikasi tiket kereta",
            vec!["Beli tiket", "Commuter Line", "LRT", "Kereta Bandara", "Tiket saya"],
            "Ucapkan beli tiket untuk memesan, atau tiket saya untuk melihat pesanan",
        ),
        Screen::IntercityBooking => (
            "Pemesanan tiket kereta antar kota",
            vec!["Pilih stasiun asal", "Pilih stasiun tujuan", "Pilih tanggal"],
            "Ucapkan kembali untuk ke menu utama",
        ),
        Screen::CommuterLine => (
            "Jadwal dan tarif Commuter Line",
            vec!["Pilih rute", "Lihat jadwal"],
            "Ucapkan kembali untuk ke menu utama",
        ),
        Screen::Lrt => (
            "Jadwal dan tarif LRT",
            vec!["Pilih rute", "Lihat jadwal"],
            "Ucapkan kembali untuk ke menu utama",
        ),
        Screen::AirportTrain => (
            "Pemesanan kereta bandara",
            vec!["Pilih bandara", "Pilih jadwal"],
            "Ucapkan kembali untuk ke menu utama",
        ),
        Screen::MyTickets => (
            "Daftar tiket yang sudah dipesan",
            vec!["Lihat detail tiket"],
            "Ucapkan kembali untuk ke menu utama",
        ),
        Screen::TripPlanner => (
            "Perencanaan perjalanan dengan asisten",
            vec!["Sebutkan tujuan perjalanan"],
            "Ucapkan kembali untuk ke menu utama",
        ),
        Screen::Settings => (
            "Pengaturan aksesibilitas dan suara",
            vec!["Ubah kecepatan suara", "Ubah volume"],
            "Ucapkan kembali untuk ke menu utama",
        ),
    };

    PageAnnouncement {
        page_title: title(screen).to_string(),
        page_description: description.to_string(),
        available_actions: actions.into_iter().map(str::to_string).collect(),
        voice_instructions: instructions.to_string(),
    }
}
