use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use lumina::access::{self, AccessService, DeviceIdentity, License, SupabaseAccess, UpgradePlan};
use lumina::board::{CardId, Layout, Slot};
use lumina::catalog::catalog;
use lumina::config::Config;
use lumina::engine::events::{Command, Event};
use lumina::engine::filters::GeometryFilter;
use lumina::engine::highlight::Highlight;
use lumina::engine::session::ReadingSession;
use lumina::interpret::{ReadingTheme, StudyLevel};
use lumina::logging::{log, obj, v_str, Domain, Level};
use lumina::narrator::{self, Narrator};
use lumina::storage::ReadingStore;
use lumina::study::StudyTopic;

const HELP: &str = "\
comandos:
  shuffle | second | toggle | clear
  layout grid|clock        manual on|off
  select N | deselect      assign N CARTA
  filter F (none, all, bridge, knight, mirror, frame, veredict, diagonals)
  study TOPICO | study off | tip
  theme geral|amor|trabalho|espiritualidade    level iniciante|intermediario|avancado
  analyze | context | show
  save TITULO | readings | load ID | delete ID
  devices | deactivate ID | upgrade MAX [DIAS]
  help | quit";

/// One parsed line of input.
#[derive(Debug, PartialEq)]
enum Input {
    Apply(Event),
    Analyze,
    Context,
    Show,
    Save(String),
    Readings,
    Load(i64),
    Delete(i64),
    Devices,
    Deactivate(String),
    Upgrade { max_devices: u32, days: Option<i64> },
    Help,
    Quit,
}

/// Board houses are numbered from 1 on screen.
fn parse_slot(arg: &str) -> Result<Slot> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(anyhow!("casa inválida: {}", arg)),
    }
}

fn required<'a>(rest: &'a str, what: &str) -> Result<&'a str> {
    if rest.is_empty() {
        Err(anyhow!("faltou {}", what))
    } else {
        Ok(rest)
    }
}

fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let arg = |what: &str| required(rest, what);

    let input = match cmd.to_lowercase().as_str() {
        "shuffle" | "embaralhar" => Input::Apply(Event::Shuffle),
        "second" | "segunda" => Input::Apply(Event::DrawSecond),
        "toggle" => Input::Apply(Event::ToggleDrawHistory),
        "clear" | "limpar" => Input::Apply(Event::Clear),
        "deselect" => Input::Apply(Event::Deselect),
        "tip" | "dica" => Input::Apply(Event::ShowTip),
        "layout" => {
            let layout = Layout::parse(arg("layout")?).ok_or_else(|| anyhow!("layout desconhecido: {}", rest))?;
            Input::Apply(Event::SetLayout(layout))
        }
        "manual" => match arg("on|off")? {
            "on" => Input::Apply(Event::SetManualMode(true)),
            "off" => Input::Apply(Event::SetManualMode(false)),
            other => return Err(anyhow!("use manual on|off, não {}", other)),
        },
        "select" => Input::Apply(Event::Select {
            slot: parse_slot(arg("casa")?)?,
        }),
        "assign" => {
            let (slot, card) = arg("casa e carta")?
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("use assign N CARTA"))?;
            let card = catalog()
                .find_card(card)
                .and_then(|c| CardId::new(c.id))
                .ok_or_else(|| anyhow!("carta desconhecida: {}", card.trim()))?;
            Input::Apply(Event::AssignManual {
                slot: parse_slot(slot)?,
                card,
            })
        }
        "filter" | "filtro" => {
            let filter = GeometryFilter::parse(arg("filtro")?).ok_or_else(|| anyhow!("filtro desconhecido: {}", rest))?;
            Input::Apply(Event::ToggleFilter(filter))
        }
        "study" | "estudo" => match arg("tópico")? {
            "off" => Input::Apply(Event::ExitStudy),
            topic => Input::Apply(Event::EnterStudy(
                StudyTopic::parse(topic).ok_or_else(|| anyhow!("tópico desconhecido: {}", topic))?,
            )),
        },
        "theme" | "tema" => {
            let theme = ReadingTheme::parse(arg("tema")?).ok_or_else(|| anyhow!("tema desconhecido: {}", rest))?;
            Input::Apply(Event::SetTheme(theme))
        }
        "level" | "nivel" | "nível" => {
            let level = StudyLevel::parse(arg("nível")?).ok_or_else(|| anyhow!("nível desconhecido: {}", rest))?;
            Input::Apply(Event::SetLevel(level))
        }
        "analyze" | "analisar" => Input::Analyze,
        "context" => Input::Context,
        "show" | "" => Input::Show,
        "save" | "salvar" => Input::Save(arg("título")?.to_string()),
        "readings" | "leituras" => Input::Readings,
        "load" | "abrir" => Input::Load(arg("id")?.parse().map_err(|_| anyhow!("id inválido: {}", rest))?),
        "delete" => Input::Delete(arg("id")?.parse().map_err(|_| anyhow!("id inválido: {}", rest))?),
        "devices" | "dispositivos" => Input::Devices,
        "deactivate" => Input::Deactivate(arg("id")?.to_string()),
        "upgrade" => {
            let mut parts = arg("limite")?.split_whitespace();
            let max_devices = parts
                .next()
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|&n| n > 0)
                .ok_or_else(|| anyhow!("use upgrade MAX [DIAS]"))?;
            let days = match parts.next() {
                Some(d) => Some(d.parse::<i64>().map_err(|_| anyhow!("dias inválidos: {}", d))?),
                None => None,
            };
            Input::Upgrade { max_devices, days }
        }
        "help" | "ajuda" | "?" => Input::Help,
        "quit" | "exit" | "sair" => Input::Quit,
        other => return Err(anyhow!("comando desconhecido: {} (help para ajuda)", other)),
    };
    Ok(input)
}

fn marker(h: Highlight) -> char {
    match h {
        Highlight::Mirror => 'M',
        Highlight::Knight => 'K',
        Highlight::Frame => 'F',
        Highlight::Axis => 'A',
        Highlight::Bridge => 'B',
        Highlight::Veredict => 'V',
        Highlight::DiagonalUp => 'U',
        Highlight::DiagonalDown => 'D',
        Highlight::Center => 'C',
        Highlight::Theme => 'T',
        Highlight::None => ' ',
    }
}

fn render(session: &ReadingSession) -> String {
    let state = session.state();
    let highlights = session.highlights();
    let cell = |slot: Slot| {
        let card = state.board.get(slot).map(|c| format!("{:>2}", c.get())).unwrap_or_else(|| "--".into());
        let sel = if state.selected == Some(slot) { '*' } else { ' ' };
        format!("{:>2}:{}{}{}", slot + 1, card, marker(highlights[slot]), sel)
    };

    let mut out = String::new();
    let mode = if state.manual { "manual" } else { "sorteio" };
    out.push_str(&format!("{} | {} | {}\n", state.layout.label(), mode, state.theme.label()));
    match state.layout {
        Layout::Grid => {
            for row in 0..4 {
                let line: Vec<String> = (row * 8..row * 8 + 8).map(&cell).collect();
                out.push_str(&line.join(" "));
                out.push('\n');
            }
            let line: Vec<String> = (32..36).map(&cell).collect();
            out.push_str(&format!("veredito: {}\n", line.join(" ")));
        }
        Layout::Clock => {
            for slot in 0..13 {
                let house = catalog().house_for(Layout::Clock, slot).map(|h| h.name.as_str()).unwrap_or("");
                out.push_str(&format!("{}  {:<24} {}\n", cell(slot), house, catalog().card_name(state.board.get(slot))));
            }
            if let Some(history) = &state.history {
                let which = if history.viewing_first { "primeira" } else { "segunda" };
                out.push_str(&format!("exibindo a {} tiragem\n", which));
            }
        }
    }
    if let Some(slot) = state.selected {
        let house = catalog().house_for(state.layout, slot).map(|h| h.name.as_str()).unwrap_or("?");
        out.push_str(&format!(
            "casa {} ({}): {}\n",
            slot + 1,
            house,
            catalog().card_name(state.board.get(slot))
        ));
    }
    if let Some(analysis) = &state.analysis {
        out.push_str(analysis);
        out.push('\n');
    }
    out
}

/// "2/3 dispositivos ativos", or just the count without a license.
fn seat_summary(active: u64, license: Option<&License>) -> String {
    match license {
        Some(l) => format!("{}/{} dispositivos ativos", active, l.max_devices),
        None => format!("{} dispositivos ativos (sem licença)", active),
    }
}

fn report(commands: &[Command]) {
    for cmd in commands {
        match cmd {
            Command::OpenCardPicker { slot } => println!("casa {}: escolha a carta com `assign {} CARTA`", slot + 1, slot + 1),
            Command::ShowBalloon(b) => println!("[dica] {}: {}", b.title, b.text),
            Command::Rejected { reason } => println!("ignorado: {}", reason),
            Command::Narrate { .. } => {}
        }
    }
}

struct Cli {
    session: ReadingSession,
    narrator: Box<dyn Narrator>,
    store: ReadingStore,
    access: Option<(SupabaseAccess, String)>,
}

impl Cli {
    /// Returns false when the user asked to quit.
    async fn handle(&mut self, input: Input) -> Result<bool> {
        match input {
            Input::Apply(event) => {
                let commands = self.session.dispatch(event);
                report(&commands);
                print!("{}", render(&self.session));
            }
            Input::Analyze => {
                if let Some((svc, _)) = &self.access {
                    access::guard_active_session(svc).await?;
                }
                match self.session.analyze(self.narrator.as_ref()).await {
                    Some(text) => println!("{}", text),
                    None => println!("{}", narrator::EMPTY_SELECTION),
                }
            }
            Input::Context => match self.session.context() {
                Some(ctx) => println!("{}", serde_json::to_string_pretty(&ctx)?),
                None => println!("{}", narrator::EMPTY_SELECTION),
            },
            Input::Show => print!("{}", render(&self.session)),
            Input::Save(title) => {
                let state = self.session.state();
                let id = self.store.save(&title, state.layout, &state.board)?;
                println!("leitura {} salva", id);
            }
            Input::Readings => {
                let readings = self.store.list()?;
                if readings.is_empty() {
                    println!("Nenhuma leitura salva.");
                }
                for r in readings {
                    println!("{:>4}  {}  {:<8} {}", r.id, r.date.format("%d/%m/%Y"), r.layout.as_str(), r.title);
                }
            }
            Input::Load(id) => match self.store.load(id)? {
                Some(saved) => {
                    let commands = self.session.dispatch(Event::Restore {
                        layout: saved.summary.layout,
                        board: Box::new(saved.board),
                    });
                    report(&commands);
                    println!("leitura {} aberta: {}", id, saved.summary.title);
                    print!("{}", render(&self.session));
                }
                None => println!("leitura {} não encontrada", id),
            },
            Input::Delete(id) => {
                if self.store.delete(id)? {
                    println!("leitura {} removida", id);
                } else {
                    println!("leitura {} não encontrada", id);
                }
            }
            Input::Devices => {
                let (svc, user_id) = self.access.as_ref().ok_or_else(|| anyhow!("acesso não configurado"))?;
                let active = svc.count_active_devices(user_id).await?;
                let license = svc.active_license(user_id).await?;
                println!("{}", seat_summary(active, license.as_ref()));
                for d in svc.list_devices(user_id).await? {
                    let seen = d.last_seen.map(|t| t.format("%d/%m/%Y %H:%M").to_string()).unwrap_or_default();
                    let status = if d.active { "ativo" } else { "inativo" };
                    println!("{}  {:<20} {:<8} {}", d.id, d.device_name, status, seen);
                }
            }
            Input::Deactivate(device_id) => {
                let (svc, user_id) = self.access.as_ref().ok_or_else(|| anyhow!("acesso não configurado"))?;
                svc.deactivate_device(user_id, &device_id).await?;
                println!("dispositivo {} desativado", device_id);
            }
            Input::Upgrade { max_devices, days } => {
                let (svc, user_id) = self.access.as_ref().ok_or_else(|| anyhow!("acesso não configurado"))?;
                let plan = UpgradePlan {
                    max_devices,
                    expires_at: days.map(|d| Utc::now() + Duration::days(d)),
                };
                svc.upgrade_license(user_id, &plan).await?;
                println!("licença atualizada: até {} dispositivos", max_devices);
            }
            Input::Help => println!("{}", HELP),
            Input::Quit => return Ok(false),
        }
        Ok(true)
    }
}

/// Sign in before the board when the hosted service is configured.
async fn open_access(cfg: &Config) -> Result<Option<(SupabaseAccess, String)>> {
    let (Some(url), Some(key)) = (&cfg.supabase_url, &cfg.supabase_anon_key) else {
        return Ok(None);
    };
    let (Some(email), Some(password)) = (&cfg.email, &cfg.password) else {
        return Err(anyhow!("defina LUMINA_EMAIL e LUMINA_PASSWORD para entrar"));
    };
    let svc = SupabaseAccess::new(url, key)?;
    let device = DeviceIdentity::load_or_create(&cfg.device_id_path)?;
    let user = access::sign_in(&svc, &device, email, password).await?;
    Ok(Some((svc, user.id)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("layout", v_str(cfg.layout.as_str())),
            ("narrator", v_str(if cfg.narrator_api_key.is_some() { "remote" } else { "unconfigured" })),
            ("access", json!(cfg.access_configured())),
            ("seed", json!(cfg.seed)),
        ]),
    );

    let access = open_access(&cfg).await.map_err(|err| {
        log(Level::Warn, Domain::Access, "gate_closed", obj(&[("msg", v_str(&err.to_string()))]));
        err
    })?;

    let mut store = ReadingStore::new(&cfg.sqlite_path)?;
    store.init()?;

    let mut cli = Cli {
        session: ReadingSession::new(cfg.layout, cfg.seed),
        narrator: narrator::from_config(&cfg),
        store,
        access,
    };
    print!("{}", render(&cli.session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let keep_going = match parse_input(&line) {
            Ok(input) => cli.handle(input).await.unwrap_or_else(|err| {
                println!("erro: {:#}", err);
                true
            }),
            Err(err) => {
                println!("{}", err);
                true
            }
        };
        if !keep_going {
            break;
        }
    }

    if let Some((svc, _)) = &cli.access {
        svc.sign_out().await?;
    }
    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}
