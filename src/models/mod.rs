// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (username unique + hash du mot de passe)
//   - installment : Plans de paiement et leurs paiements mensuels
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les paiements mensuels sont stockés dans une colonne JSONB du plan:
//     un plan et ses paiements forment un seul document, donc une écriture
//     de plan est une seule écriture de ligne (atomique)
//   - Les relations entre tables sont définies dans chaque modèle
//
// ============================================================================

pub mod health;
pub mod users;
pub mod installment;
pub mod dto;
