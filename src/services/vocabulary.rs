use crate::models::report::CommanderEntry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Inventory item the readers know how to count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    pub unit_value: i64,
    /// Dominant colours the item's icon may be reported with
    #[serde(default)]
    pub colors: Vec<String>,
}

/// Label synonyms for the battle report ledger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarLabels {
    pub units: Vec<String>,
    pub dead: Vec<String>,
    pub severely_wounded: Vec<String>,
    pub slightly_wounded: Vec<String>,
    pub remaining: Vec<String>,
    pub healed: Vec<String>,
    pub watchtower: Vec<String>,
    pub kill_points: Vec<String>,
    pub victory: Vec<String>,
    pub defeat: Vec<String>,
    pub barbarian: Vec<String>,
    pub global_blacklist: Vec<String>,
    pub ui_blacklist: Vec<String>,
    /// Words that show up beside PvE targets and are never player names
    pub pve_terms: Vec<String>,
}

impl WarLabels {
    /// Every metric label, in any language
    pub fn all_metric_labels(&self) -> impl Iterator<Item = &String> {
        self.units
            .iter()
            .chain(&self.dead)
            .chain(&self.severely_wounded)
            .chain(&self.slightly_wounded)
            .chain(&self.remaining)
            .chain(&self.healed)
            .chain(&self.watchtower)
            .chain(&self.kill_points)
    }
}

/// Read-only lookup tables shared by every request.
///
/// Built once at startup and passed by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    pub governor_labels: Vec<String>,
    pub alliance_labels: Vec<String>,
    pub power_labels: Vec<String>,
    pub kill_points_labels: Vec<String>,
    pub civilization_labels: Vec<String>,
    pub status_labels: Vec<String>,
    pub ui_keywords: Vec<String>,
    pub civilizations: Vec<String>,
    pub war: WarLabels,
    pub action_point_items: Vec<ItemDefinition>,
    pub experience_books: Vec<ItemDefinition>,
    pub ownership_keywords: Vec<String>,
    pub commanders: Vec<CommanderEntry>,
    pub npcs: Vec<CommanderEntry>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn item(id: &str, name: &str, unit_value: i64, colors: &[&str]) -> ItemDefinition {
    ItemDefinition {
        id: id.to_string(),
        name: name.to_string(),
        unit_value,
        colors: strings(colors),
    }
}

fn entity(id: &str, canonical_name: &str, labels: &[&str], rarity: &str, expertise: &str) -> CommanderEntry {
    CommanderEntry {
        id: id.to_string(),
        canonical_name: canonical_name.to_string(),
        labels: strings(labels),
        rarity: rarity.to_string(),
        expertise: expertise.to_string(),
    }
}

impl Vocabulary {
    /// Built-in multilingual tables
    pub fn builtin() -> Self {
        Self {
            governor_labels: strings(&[
                "Governador", "Governor", "Gouverneur", "Gobernador", "ID", "ID:", "(ID", "lD", "1D",
                "Statthalter", "Правитель", "Vali", "执政官", "집정관", "領主", "الحاكم",
            ]),
            alliance_labels: strings(&[
                "Alianca", "Alliance", "Alianza", "Aliança", "Allianz", "Альянс", "Ittifak", "联盟", "연맹",
                "同盟", "التحالف",
            ]),
            power_labels: strings(&[
                "Poder", "Power", "Puissance", "P0der", "Powcr", "Poder de Combate", "Macht", "Мощь", "Guc",
                "Güç", "战力", "战斗力", "전투력", "戦力", "القوة", "Sức mạnh",
            ]),
            kill_points_labels: strings(&[
                "Pontos de Abate", "Kill Points", "Kills", "Abate", "Muertes", "Points de kill",
                "Troupes tuées", "Tötungspunkte", "Очки убийств", "Oldurme Puani", "击杀", "击杀积分", "처치",
                "처치 포인트", "撃破", "نقاط القتل",
            ]),
            civilization_labels: strings(&["Civilizacao", "Civilização", "Civilization", "Civilizacion"]),
            status_labels: strings(&[
                "Pontos de Acao", "Action Points", "AP", "Barra", "Nivel", "Stamina", "Energie", "Endurance",
            ]),
            ui_keywords: strings(&[
                "VIP", "Mais Informacoes", "More Info", "Perfil", "Profile", "Construir", "Build", "Recrutar",
                "Recruit", "Pesquisar", "Research", "Reparar", "Repair", "Chat", "Mensagem", "Message",
                "Comandante", "Commander", "Tropas", "Troops", "Conquistas", "Achievements", "Configuracoes",
                "Settings", "Ranking", "Classificacao", "Guia", "Guide", "Retrospecto", "Temporada", "Season",
                "UTC", "Câmara", "City Hall", "Prefeitura", "Hotel de Ville", "Rathaus", "Настройки",
                "Einstellungen", "设置", "설정", "Campeoes", "Olimpia", "Olympia", "Arca", "Osiris", "Reino",
                "Perdido", "Lost Kingdom", "Vitorias", "Wins", "Victories", "Siege", "Victoires", "Autarca",
                "Oculto", "Hidden", "N/A", "NIA", "Bronze", "Ferro", "Idade", "Age", "Feudal", "Dark", "Trevas",
            ]),
            civilizations: strings(&[
                "Roma", "Rome", "Rom", "Рим", "Alemanha", "Germany", "Allemagne", "Deutschland", "Германия",
                "Britania", "Britain", "Grande-Bretagne", "Britannien", "Британия", "Franca", "France",
                "França", "Frankreich", "Франция", "Espanha", "Spain", "Espagne", "Spanien", "Испания",
                "Viking", "Vikings", "Wikinger", "Викинги", "Grecia", "Greece", "Grece", "Griechenland",
                "Греция", "China", "Chine", "Китай", "中国", "중국", "Japao", "Japan", "Japon", "Япония", "日本",
                "Coreia", "Korea", "Coree", "Корея", "한국", "Arabia", "Arabie", "Аравия", "العربية", "Otomano",
                "Ottoman", "Ottomane", "Osmanisches", "Османы", "Bizancio", "Byzantium", "Byzance", "Byzanz",
                "Egito", "Egypt", "Egypte", "Ägypten", "Египет",
            ]),
            war: WarLabels {
                units: strings(&[
                    "Unidades de Tropas", "Troops", "Unidades", "兵数", "Units", "Truppen", "Troupes",
                    "Unidades de tropa", "Войска", "部队", "部隊", "Truppe", "Unità", "Birlikler", "부대", "병력",
                    "Quân đội", "Pasukan", "القوات",
                ]),
                dead: strings(&[
                    "Morto", "Dead", "Todesfälle", "死者", "战死", "Tués", "Muertos", "Мертвые", "陣亡", "Morti",
                    "Ölü", "전사", "사망", "Tử trận", "Tewas", "القتلى",
                ]),
                severely_wounded: strings(&[
                    "Gravemente ferido", "Gravemente ferida", "Severely Wounded", "重傷", "重伤",
                    "Schwer verwundet", "Gravement blessés", "Heridos graves", "Тяжело ранены",
                    "Feriti gravemente", "Ağır Yaralı", "중상", "Trọng thương", "Luka Parah", "إصابة بليغة",
                ]),
                slightly_wounded: strings(&[
                    "Levemente ferida", "Levemente ferido", "Slightly Wounded", "軽傷", "轻伤",
                    "Leicht verwundet", "Légèrement blessés", "Heridos leves", "Легко ранены",
                    "Feriti lievemente", "Hafif Yaralı", "경상", "Khinh thương", "Luka Ringan", "إصابة طفيفة",
                ]),
                remaining: strings(&[
                    "Restante", "Remaining", "残存数", "剩余", "Verbleibend", "Restantes", "Осталось", "剩餘",
                    "Rimanenti", "Kalan", "잔여", "남은 병력", "Còn lại", "Tersisa", "المتبقية",
                ]),
                healed: strings(&[
                    "Cura", "Healed", "Heal", "治疗", "Heilung", "Soin", "Curados", "Исцелено", "治療", "Guariti",
                    "İyileştirilen", "치료", "Đã chữa trị", "Disembuhkan", "تم الشفاء",
                ]),
                watchtower: strings(&[
                    "Dano de Torre de Vigia", "Watchtower Damage", "警戒塔伤害", "警戒塔傷害", "Wachturm-Schaden",
                    "Dégâts de tour de guet", "Урон сторожевой башни", "Danni torre di guardia",
                    "Gözcü Kulesi Hasarı", "경계탑 피해", "Sát thương tháp canh", "ضرر برج المراقبة",
                ]),
                kill_points: strings(&[
                    "Pontos de Abate", "Kill Points", "撃破ポイント", "击杀积分", "Tötungspunkte",
                    "Points de kill", "Puntos de muerte", "擊殺積分", "Punti uccisione", "Öldürme Puanı",
                    "처치 포인트", "킬 포인트", "Điểm tiêu diệt", "Poin Kill", "نقاط القتل",
                ]),
                victory: strings(&[
                    "Vitoria", "Vitória", "Victory", "Vitoire", "勝利", "Sieg", "Victoria", "Победа", "胜利",
                    "Vittoria", "Zafer", "승리", "Chiến thắng", "Kemenangan", "نصر",
                ]),
                defeat: strings(&[
                    "Derrota", "Defeat", "Défaite", "敗北", "Niederlage", "Поражение", "失败", "失敗", "Sconfitta",
                    "Yenilgi", "패배", "Thất bại", "Kekalahan", "هزيمة",
                ]),
                barbarian: strings(&[
                    "Barbaro", "Bárbaro", "Barbarian", "野蛮人", "Barbare", "Bárbaros", "野蠻人", "Barbar",
                    "Barbarlar", "Варвар", "야만인", "Người man rợ", "البربر",
                ]),
                global_blacklist: strings(&[
                    "PESSOAL", "RELATORIO", "ALIANCA", "SISTEMA", "ENVIADO", "FAVORITOS", "Nova mensagem",
                    "Ordenar por categoria", "Aldeia Tribal", "Horas atras", "Ataque cancelado", "Compartilhar",
                    "PERSONAL", "REPORT", "ALLIANCE", "SYSTEM", "FAVORITES", "New Message", "Sort by Category",
                    "Exploration Report", "Battle Report", "Tribal Village", "Attack Cancelled", "Point Refund",
                    "Read and Claim All", "Share", "Just now", "个人", "战报", "系统", "已发送", "收藏", "一键已读",
                    "部落村庄", "報告", "システム", "お気に入り", "개인", "리포트", "시스템", "즐겨찾기",
                    "PERSÖNLICH", "BERICHT", "GESENDET", "FAVORITEN", "Stammesdorf", "PERSONNEL", "RAPPORT",
                    "SYSTÈME", "FAVORIS", "Village tribal", "INFORME", "Aldea tribal", "ОТЧЕТ", "ИЗБРАННОЕ",
                ]),
                ui_blacklist: strings(&[
                    "Pessoal", "Relatório", "Aliança", "Sistema", "Enviado", "Favoritos", "Ordenar", "Categoria",
                    "Explora", "Batalha", "Tropas", "Dano", "Recebido", "Abates", "Personal", "Report",
                    "Alliance", "System", "Favorites", "Sort", "Category", "Exploration", "Battle", "Troops",
                    "Damage", "Taken", "Kills", "分类", "排序", "探索", "战斗", "並べ替え", "カテゴリ", "戦闘",
                    "정렬", "카테고리", "탐색", "전투", "Категория", "Разведка", "Битва", "Sortieren",
                    "Kategorie", "Erkundung", "Trier", "Catégorie", "Categoría", "Exploración", "Sırala",
                    "Keşif", "Sắp xếp", "Danh mục", "Urutkan", "Jelajah",
                ]),
                pve_terms: strings(&["Restante", "Poder", "Invasores", "Chefes", "Vago", "Mensagem"]),
            },
            action_point_items: vec![
                item("AP_50", "Emergency Action Point Recovery", 50, &[]),
                item("AP_100", "Basic Action Point Recovery", 100, &[]),
                item("AP_500", "Intermediate Action Point Recovery", 500, &[]),
                item("AP_1000", "Advanced Action Point Recovery", 1000, &[]),
            ],
            experience_books: vec![
                item("XP_100", "Tome of Knowledge (100)", 100, &["Blue", "Purple"]),
                item("XP_500", "Tome of Knowledge (500)", 500, &["Blue", "Purple"]),
                item("XP_1000", "Tome of Knowledge (1,000)", 1000, &["Purple", "Blue"]),
                item("XP_5000", "Tome of Knowledge (5,000)", 5000, &["Purple", "Blue"]),
                item("XP_10000", "Tome of Knowledge (10,000)", 10000, &["Gold", "Purple", "Blue"]),
                item("XP_20000", "Tome of Knowledge (20,000)", 20000, &["Gold", "Blue"]),
                item("XP_50000", "Tome of Knowledge (50,000)", 50000, &["Gold", "Blue"]),
            ],
            ownership_keywords: strings(&[
                "Own", "Owned", "Possui", "Possuído", "Possiede", "Possédés", "Eigener", "Possédé", "Im Besitz",
            ]),
            commanders: vec![
                entity("sun_tzu", "Sun Tzu", &["Sun Tzu", "孙武"], "Legendary", "Infantry"),
                entity("cao_cao", "Cao Cao", &["Cao Cao", "曹操"], "Legendary", "Cavalry"),
                entity("richard_i", "Richard I", &["Richard I", "Ricardo I"], "Legendary", "Infantry"),
                entity("yi_seong_gye", "Yi Seong-Gye", &["Yi Seong-Gye", "이성계"], "Legendary", "Archer"),
                entity("boudica", "Boudica", &["Boudica", "Boadiceia"], "Epic", "Mixed"),
                entity("pelagius", "Pelagius", &["Pelagius", "Pelágio"], "Epic", "Cavalry"),
                entity("julius_caesar", "Julius Caesar", &["Julius Caesar", "Júlio César"], "Legendary", "Infantry"),
                entity("charles_martel", "Charles Martel", &["Charles Martel", "Carlos Martel"], "Legendary", "Infantry"),
                entity("guan_yu", "Guan Yu", &["Guan Yu", "关羽"], "Legendary", "Cavalry"),
                entity("aethelflaed", "Aethelflaed", &["Aethelflaed", "Etelfleda"], "Legendary", "Mixed"),
            ],
            npcs: vec![
                entity("barbarian_leader", "Barbarian Leader", &["Barbarian Leader", "Líder Bárbaro"], "Elite", "Mixed"),
                entity("barbarian_shaman", "Barbarian Shaman", &["Barbarian Shaman", "Xamã Bárbaro"], "Elite", "Mixed"),
            ],
        }
    }

    /// Replace the commander and NPC tables with `commanders.json` and
    /// `npcs.json` from `dir`. A missing or malformed file is logged and
    /// leaves that table empty.
    pub fn load_entities(&mut self, dir: &Path) {
        self.commanders = load_entity_file(&dir.join("commanders.json"), "Commanders");
        self.npcs = load_entity_file(&dir.join("npcs.json"), "NPCs");
    }

    pub fn with_entities_from(mut self, dir: &Path) -> Self {
        self.load_entities(dir);
        self
    }
}

fn load_entity_file(path: &Path, label: &str) -> Vec<CommanderEntry> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(table = label, path = %path.display(), error = %e, "Vocabulary file not readable");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<CommanderEntry>>(&content) {
        Ok(entries) => {
            info!(table = label, count = entries.len(), "Vocabulary loaded");
            entries
        }
        Err(e) => {
            error!(table = label, path = %path.display(), error = %e, "Vocabulary file malformed");
            Vec::new()
        }
    }
}
