// Board-Bring-up: gemeinsam für alle Sketch-Binaries
//
// Initialisiert Heap, Embassy Runtime, WiFi-Radio und Netzwerk-Stack und
// liefert Link und Broker-Client für die Schleife. Die GPIOs bleiben beim
// Aufrufer, jeder Sketch belegt andere Pins.

use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, StackResources};
use esp_hal::clock::CpuClock;
use esp_hal::peripherals::{Peripherals, SW_INTERRUPT, TIMG0, WIFI};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

use crate::config::{EXTRA_HEAP_SIZE, WIFI_HEAP_SIZE};
use crate::net::{SessionBuffers, TbBroker, WifiLink, net_task};

/// Sockets im Stack: MQTT (1) + DNS (1) + DHCP (1)
const STACK_SOCKETS: usize = 3;

/// Netzwerk-Seite der Schleife
pub struct Network {
    pub link: WifiLink,
    pub broker: TbBroker,
}

/// Initialisiert HAL und Heap
///
/// ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz).
pub fn init() -> Peripherals {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
    // Zwei Bereiche: reclaimed RAM (64 KB) + extra (36 KB) = 100 KB total
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    peripherals
}

/// Startet Embassy Runtime, WiFi-Radio und Netzwerk-Stack
///
/// Der Link ist danach noch nicht verbunden; das erledigt die Schleife
/// über `Link::join`.
pub fn start_network(
    spawner: &Spawner,
    timg0: TIMG0<'static>,
    sw_interrupt: SW_INTERRUPT<'static>,
    wifi: WIFI<'static>,
) -> Network {
    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(timg0);
    let sw_interrupt = esp_hal::interrupt::software::SoftwareInterruptControl::new(sw_interrupt);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // WiFi Hardware initialisieren
    static RADIO_INIT: StaticCell<esp_radio::Controller> = StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, wifi, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    static RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    // embassy-net erstellt Stack + Runner (nutzt STA interface für Client-Modus)
    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );
    spawner.spawn(net_task(runner)).unwrap();

    static BUFFERS: StaticCell<SessionBuffers> = StaticCell::new();
    let buffers = BUFFERS.init(SessionBuffers::new());

    Network {
        link: WifiLink::new(wifi_controller, stack),
        broker: TbBroker::new(stack, buffers),
    }
}
